//! [`Trigger`] – boolean conditions over the input snapshot.
//!
//! Triggers are pure predicates; the scheduler evaluates each binding's
//! trigger exactly once per tick and feeds the result through an
//! [`EdgeDetector`] to decide whether to start or stop its task.
//!
//! # Example
//!
//! ```rust
//! use gigan_runtime::trigger::{Edge, EdgeDetector, Trigger};
//! use gigan_types::InputSnapshot;
//!
//! let dump = Trigger::button("copilot.trigger");
//! let mut edges = EdgeDetector::default();
//!
//! let released = InputSnapshot::new();
//! let pressed = InputSnapshot::new().with_button("copilot.trigger", true);
//!
//! assert_eq!(edges.update(dump.evaluate(&released)), Edge::Low);
//! assert_eq!(edges.update(dump.evaluate(&pressed)), Edge::Rising);
//! assert_eq!(edges.update(dump.evaluate(&pressed)), Edge::High);
//! assert_eq!(edges.update(dump.evaluate(&released)), Edge::Falling);
//! ```

use std::fmt;
use std::sync::Arc;

use gigan_types::{InputSnapshot, Pov};

type Predicate = Arc<dyn Fn(&InputSnapshot) -> bool + Send + Sync>;

/// A named, composable condition over an [`InputSnapshot`].
#[derive(Clone)]
pub struct Trigger {
    label: String,
    predicate: Predicate,
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Trigger").field(&self.label).finish()
    }
}

impl Trigger {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&InputSnapshot) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// True while the named button is held.
    pub fn button(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), move |input| input.button(&name))
    }

    /// True while the named axis reads strictly above `threshold`.
    pub fn axis_above(name: impl Into<String>, threshold: f64) -> Self {
        let name = name.into();
        Self::new(format!("{name} > {threshold}"), move |input| {
            input.axis(&name) > threshold
        })
    }

    /// True while the named axis reads strictly below `threshold`.
    pub fn axis_below(name: impl Into<String>, threshold: f64) -> Self {
        let name = name.into();
        Self::new(format!("{name} < {threshold}"), move |input| {
            input.axis(&name) < threshold
        })
    }

    /// True while the hat switch points in any of `positions`.
    pub fn pov_any(positions: &[Pov]) -> Self {
        let positions = positions.to_vec();
        Self::new(format!("pov in {positions:?}"), move |input| {
            positions.contains(&input.pov())
        })
    }

    pub fn and(self, other: Trigger) -> Self {
        let label = format!("({} && {})", self.label, other.label);
        Self::new(label, move |input| {
            self.evaluate(input) && other.evaluate(input)
        })
    }

    pub fn or(self, other: Trigger) -> Self {
        let label = format!("({} || {})", self.label, other.label);
        Self::new(label, move |input| {
            self.evaluate(input) || other.evaluate(input)
        })
    }

    pub fn negate(self) -> Self {
        let label = format!("!{}", self.label);
        Self::new(label, move |input| !self.evaluate(input))
    }

    pub fn evaluate(&self, input: &InputSnapshot) -> bool {
        (self.predicate)(input)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Edge detection
// ─────────────────────────────────────────────────────────────────────────────

/// Change of a trigger's value between two consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    High,
    Low,
}

/// Remembers the previous value of one trigger.  Starts low, so a trigger
/// that is already true on the first tick produces a rising edge.
#[derive(Debug, Default, Clone)]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    pub fn update(&mut self, current: bool) -> Edge {
        let edge = match (self.previous, current) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            (true, true) => Edge::High,
            (false, false) => Edge::Low,
        };
        self.previous = current;
        edge
    }

    pub fn is_high(&self) -> bool {
        self.previous
    }
}

/// How a binding reacts to its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Start a task on the rising edge; it runs until done or interrupted.
    OnTrue,
    /// Start a task on the falling edge.
    OnFalse,
    /// Start on the rising edge, end with `interrupted == false` on the
    /// falling edge.
    WhileTrue,
    /// Start on a rising edge, cancel on the next one.
    ToggleOnTrue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_thresholds_are_strict() {
        let up = Trigger::axis_above("copilot.throttle", 0.0);
        let down = Trigger::axis_below("copilot.throttle", 0.0);
        let centered = InputSnapshot::new().with_axis("copilot.throttle", 0.0);
        let forward = InputSnapshot::new().with_axis("copilot.throttle", 0.4);

        assert!(!up.evaluate(&centered));
        assert!(!down.evaluate(&centered));
        assert!(up.evaluate(&forward));
        assert!(!down.evaluate(&forward));
    }

    #[test]
    fn pov_any_matches_listed_positions() {
        let high = Trigger::pov_any(&[Pov::NorthWest, Pov::North, Pov::NorthEast]);
        assert!(high.evaluate(&InputSnapshot::new().with_pov(Pov::NorthEast)));
        assert!(!high.evaluate(&InputSnapshot::new().with_pov(Pov::East)));
        assert!(!high.evaluate(&InputSnapshot::new()));
    }

    #[test]
    fn composition() {
        let a = Trigger::button("a");
        let b = Trigger::button("b");
        let both = a.clone().and(b.clone());
        let either = a.clone().or(b);
        let not_a = a.negate();

        let only_a = InputSnapshot::new().with_button("a", true);
        assert!(!both.evaluate(&only_a));
        assert!(either.evaluate(&only_a));
        assert!(!not_a.evaluate(&only_a));
        assert!(not_a.evaluate(&InputSnapshot::new()));
        assert_eq!(both.label(), "(a && b)");
    }

    #[test]
    fn disconnected_controller_never_fires() {
        let t = Trigger::button("a").or(Trigger::axis_above("x", 0.5));
        let mut input = InputSnapshot::disconnected();
        input.set_button("a", true);
        input.set_axis("x", 1.0);
        assert!(!t.evaluate(&input));
    }

    #[test]
    fn edge_detector_starts_low() {
        let mut edges = EdgeDetector::default();
        assert_eq!(edges.update(true), Edge::Rising);
        assert!(edges.is_high());
        assert_eq!(edges.update(false), Edge::Falling);
        assert_eq!(edges.update(false), Edge::Low);
    }
}
