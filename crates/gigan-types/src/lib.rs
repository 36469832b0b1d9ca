use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An exclusivity domain: one physical actuator or actuator group
/// (e.g. `"intake.front"`, `"dump"`, `"drivebase"`).
///
/// At any instant at most one running task may hold a given tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTag(String);

impl ResourceTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Identity of one scheduled task instance.  Every admission of a task
/// factory produces a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first uuid group is plenty to tell tasks apart in logs.
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}

/// Admission priority of a task.  A claim yields to any incoming claim of the
/// same or higher priority and blocks incoming claims of lower priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Priority {
    /// Default ("no trigger") tasks that run only while a resource is unowned.
    Idle,
    /// Operator- and routine-triggered tasks.
    #[default]
    Normal,
    /// Tasks that must not be pre-empted by normal traffic.
    Critical,
}

/// Abstract command applied to a mechanism.  Mechanisms map it onto the
/// underlying hardware writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum Action {
    /// Zero output.
    Stop,
    /// Run at the mechanism's nominal speed.
    Forward,
    /// Run at the negated nominal speed.
    Reverse,
    /// Run at an explicit duty cycle in `[-1, 1]`.
    Speed(f64),
    /// Drive a double solenoid to its forward position.
    Extend,
    /// Drive a double solenoid to its reverse position.
    Retract,
    /// Field-relative chassis velocity request, each component in `[-1, 1]`.
    Drive { vx: f64, vy: f64, omega: f64 },
    /// Point the swerve modules inward to resist being pushed.
    Lock,
    /// Re-zero the chassis heading.
    ZeroHeading,
}

/// Directional pad / hat switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Pov {
    #[default]
    Centered,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Pov {
    /// Convert a raw hat angle in degrees (`-1` when released) to a [`Pov`].
    /// Angles that are not a multiple of 45° read as [`Pov::Centered`].
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees {
            0 => Pov::North,
            45 => Pov::NorthEast,
            90 => Pov::East,
            135 => Pov::SouthEast,
            180 => Pov::South,
            225 => Pov::SouthWest,
            270 => Pov::West,
            315 => Pov::NorthWest,
            _ => Pov::Centered,
        }
    }

    /// The hat angle in degrees, or `None` when centered.
    pub fn degrees(self) -> Option<u16> {
        match self {
            Pov::Centered => None,
            Pov::North => Some(0),
            Pov::NorthEast => Some(45),
            Pov::East => Some(90),
            Pov::SouthEast => Some(135),
            Pov::South => Some(180),
            Pov::SouthWest => Some(225),
            Pov::West => Some(270),
            Pov::NorthWest => Some(315),
        }
    }
}

/// Immutable operator input captured once at the start of a tick.
///
/// Reads never fail: unknown names and a disconnected controller both yield
/// neutral values (`false`, `0.0`, [`Pov::Centered`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    connected: bool,
    buttons: BTreeMap<String, bool>,
    axes: BTreeMap<String, f64>,
    pov: Pov,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSnapshot {
    /// An empty snapshot from a connected controller.
    pub fn new() -> Self {
        Self {
            connected: true,
            buttons: BTreeMap::new(),
            axes: BTreeMap::new(),
            pov: Pov::Centered,
        }
    }

    /// A snapshot representing an unplugged controller.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::new()
        }
    }

    pub fn with_button(mut self, name: impl Into<String>, pressed: bool) -> Self {
        self.buttons.insert(name.into(), pressed);
        self
    }

    pub fn with_axis(mut self, name: impl Into<String>, value: f64) -> Self {
        self.axes.insert(name.into(), value);
        self
    }

    pub fn with_pov(mut self, pov: Pov) -> Self {
        self.pov = pov;
        self
    }

    pub fn set_button(&mut self, name: impl Into<String>, pressed: bool) {
        self.buttons.insert(name.into(), pressed);
    }

    pub fn set_axis(&mut self, name: impl Into<String>, value: f64) {
        self.axes.insert(name.into(), value);
    }

    pub fn set_pov(&mut self, pov: Pov) {
        self.pov = pov;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn button(&self, name: &str) -> bool {
        self.connected && self.buttons.get(name).copied().unwrap_or(false)
    }

    /// Axis value clamped to `[-1, 1]`; NaN reads as `0.0`.
    pub fn axis(&self, name: &str) -> f64 {
        if !self.connected {
            return 0.0;
        }
        match self.axes.get(name) {
            Some(v) if v.is_finite() => v.clamp(-1.0, 1.0),
            Some(v) if v.is_infinite() => v.signum(),
            _ => 0.0,
        }
    }

    pub fn pov(&self) -> Pov {
        if self.connected { self.pov } else { Pov::Centered }
    }
}

/// Raw CAN bus error counters.  Both are monotonic but may wrap or be reset
/// by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusStatus {
    pub rx_errors: u32,
    pub tx_errors: u32,
}

/// Per-tick hardware telemetry.  `None` marks a reading that could not be
/// obtained this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Telemetry {
    pub bus: Option<BusStatus>,
    pub supply_voltage: Option<f64>,
    pub enabled: bool,
}

/// Error type shared by the mechanism, arbitration and scheduling layers.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GiganError {
    #[error("Task Fault in {task}: {details}")]
    TaskFault { task: String, details: String },

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Unknown Resource: {0}")]
    UnknownResource(ResourceTag),

    #[error("Resource {resource} is already held by {holder}")]
    ResourceBusy { resource: ResourceTag, holder: String },

    #[error("Task {task} wrote to {resource} without holding it")]
    ResourceNotHeld { task: String, resource: ResourceTag },

    #[error("{component} cannot apply {action:?}")]
    UnsupportedAction { component: String, action: Action },

    #[error("Configuration Error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_input_reads_neutral() {
        let mut input = InputSnapshot::disconnected();
        input.set_button("copilot.trigger", true);
        input.set_axis("copilot.throttle", 0.8);
        input.set_pov(Pov::North);

        assert!(!input.is_connected());
        assert!(!input.button("copilot.trigger"));
        assert_eq!(input.axis("copilot.throttle"), 0.0);
        assert_eq!(input.pov(), Pov::Centered);
    }

    #[test]
    fn unknown_names_read_neutral() {
        let input = InputSnapshot::new();
        assert!(!input.button("ghost"));
        assert_eq!(input.axis("ghost"), 0.0);
    }

    #[test]
    fn axis_is_clamped_and_nan_is_zero() {
        let input = InputSnapshot::new()
            .with_axis("a", 3.0)
            .with_axis("b", -7.5)
            .with_axis("c", f64::NAN)
            .with_axis("d", f64::NEG_INFINITY);
        assert_eq!(input.axis("a"), 1.0);
        assert_eq!(input.axis("b"), -1.0);
        assert_eq!(input.axis("c"), 0.0);
        assert_eq!(input.axis("d"), -1.0);
    }

    #[test]
    fn pov_degrees_mapping() {
        assert_eq!(Pov::from_degrees(-1), Pov::Centered);
        assert_eq!(Pov::from_degrees(45), Pov::NorthEast);
        assert_eq!(Pov::from_degrees(315), Pov::NorthWest);
        assert_eq!(Pov::from_degrees(30), Pov::Centered);
        assert_eq!(Pov::SouthWest.degrees(), Some(225));
        assert_eq!(Pov::Centered.degrees(), None);
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::Idle < Priority::Normal);
        assert!(Priority::Normal < Priority::Critical);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn task_ids_are_unique() {
        let a = TaskId::new();
        let b = TaskId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 8);
    }

    #[test]
    fn action_serializes_with_tag() {
        let action = Action::Drive {
            vx: 0.5,
            vy: 0.0,
            omega: -0.25,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"action\":\"Drive\""));
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn resource_tag_is_transparent_in_json() {
        let tag = ResourceTag::new("intake.front");
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"intake.front\"");
        assert_eq!(tag.to_string(), "intake.front");
    }

    #[test]
    fn gigan_error_display() {
        let err = GiganError::ResourceNotHeld {
            task: "dump_extend".into(),
            resource: ResourceTag::new("climber"),
        };
        assert!(err.to_string().contains("climber"));

        let err = GiganError::UnsupportedAction {
            component: "dump".into(),
            action: Action::Forward,
        };
        assert!(err.to_string().contains("Forward"));
    }
}
