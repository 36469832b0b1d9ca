//! Timed operator inputs and telemetry for the match simulator.
//!
//! A script is a TOML file with one `[[event]]` table per change:
//!
//! ```toml
//! [[event]]
//! at_secs = 16.0
//! button = "copilot.4"      # pressed = true is the default
//!
//! [[event]]
//! at_secs = 18.5
//! button = "copilot.4"
//! pressed = false
//!
//! [[event]]
//! at_secs = 20.0
//! axis = "pilot.left_y"
//! value = -0.6
//!
//! [[event]]
//! at_secs = 25.0
//! pov = 0                   # -1 releases the hat
//!
//! [[event]]
//! at_secs = 40.0
//! supply_voltage = 10.7
//! bus_errors = 3            # added to the rx error counter
//! ```
//!
//! Events apply at the first tick at or after `at_secs` and persist until a
//! later event changes the same control.

use std::path::Path;
use std::time::Duration;

use gigan_types::{BusStatus, InputSnapshot, Pov, Telemetry};
use serde::Deserialize;

fn pressed_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptEvent {
    pub at_secs: f64,
    #[serde(default)]
    pub button: Option<String>,
    #[serde(default = "pressed_default")]
    pub pressed: bool,
    #[serde(default)]
    pub axis: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub pov: Option<i32>,
    #[serde(default)]
    pub supply_voltage: Option<f64>,
    #[serde(default)]
    pub bus_errors: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ScriptFile {
    #[serde(default)]
    event: Vec<ScriptEvent>,
}

/// Simulated world state the script drives.
#[derive(Debug, Clone)]
pub struct SimWorld {
    pub input: InputSnapshot,
    pub supply_voltage: f64,
    pub bus: BusStatus,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self {
            input: InputSnapshot::new(),
            supply_voltage: 12.6,
            bus: BusStatus::default(),
        }
    }
}

impl SimWorld {
    pub fn telemetry(&self, enabled: bool) -> Telemetry {
        Telemetry {
            bus: Some(self.bus),
            supply_voltage: Some(self.supply_voltage),
            enabled,
        }
    }

    fn apply(&mut self, event: &ScriptEvent) {
        if let Some(button) = &event.button {
            self.input.set_button(button.clone(), event.pressed);
        }
        if let (Some(axis), Some(value)) = (&event.axis, event.value) {
            self.input.set_axis(axis.clone(), value);
        }
        if let Some(degrees) = event.pov {
            self.input.set_pov(Pov::from_degrees(degrees));
        }
        if let Some(volts) = event.supply_voltage {
            self.supply_voltage = volts;
        }
        if let Some(errors) = event.bus_errors {
            self.bus.rx_errors = self.bus.rx_errors.wrapping_add(errors);
        }
    }
}

/// Time-ordered events with a replay cursor.
#[derive(Debug, Default)]
pub struct InputScript {
    events: Vec<ScriptEvent>,
    cursor: usize,
}

impl InputScript {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let file: ScriptFile =
            toml::from_str(raw).map_err(|e| format!("Failed to parse input script: {}", e))?;
        let mut events = file.event;
        if let Some(bad) = events.iter().find(|e| !e.at_secs.is_finite() || e.at_secs < 0.0) {
            return Err(format!("Invalid event time {} in input script", bad.at_secs));
        }
        events.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Ok(Self { events, cursor: 0 })
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read input script {}: {}", path.display(), e))?;
        Self::parse(&raw)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Apply every event due at or before `now`.  Returns how many fired.
    pub fn advance(&mut self, now: Duration, world: &mut SimWorld) -> usize {
        let t = now.as_secs_f64();
        let start = self.cursor;
        while let Some(event) = self.events.get(self.cursor) {
            if event.at_secs > t {
                break;
            }
            world.apply(event);
            self.cursor += 1;
        }
        self.cursor - start
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
        [[event]]
        at_secs = 2.0
        button = "copilot.4"
        pressed = false

        [[event]]
        at_secs = 1.0
        button = "copilot.4"

        [[event]]
        at_secs = 1.0
        axis = "pilot.left_y"
        value = -0.5

        [[event]]
        at_secs = 3.0
        pov = 180
        supply_voltage = 10.5
        bus_errors = 2
    "#;

    #[test]
    fn events_replay_in_time_order() {
        let mut script = InputScript::parse(SCRIPT).unwrap();
        let mut world = SimWorld::default();
        assert_eq!(script.len(), 4);

        assert_eq!(script.advance(Duration::from_millis(980), &mut world), 0);
        assert_eq!(script.advance(Duration::from_millis(1000), &mut world), 2);
        assert!(world.input.button("copilot.4"));
        assert_eq!(world.input.axis("pilot.left_y"), -0.5);

        assert_eq!(script.advance(Duration::from_millis(2000), &mut world), 1);
        assert!(!world.input.button("copilot.4"));

        script.advance(Duration::from_secs(5), &mut world);
        assert!(script.is_done());
        assert_eq!(world.input.pov(), Pov::South);
        let telemetry = world.telemetry(false);
        assert_eq!(telemetry.supply_voltage, Some(10.5));
        assert_eq!(telemetry.bus.map(|b| b.rx_errors), Some(2));
    }

    #[test]
    fn empty_script_is_valid() {
        let script = InputScript::parse("").unwrap();
        assert!(script.is_empty());
        assert!(script.is_done());
    }

    #[test]
    fn negative_time_is_rejected() {
        let err = InputScript::parse("[[event]]\nat_secs = -1.0\nbutton = \"a\"\n").unwrap_err();
        assert!(err.contains("Invalid event time"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let err = InputScript::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.contains("nope.toml"));
    }
}
