//! Generic `Solenoid` trait for double-acting pneumatic valves.

use gigan_types::GiganError;

/// Position of a double solenoid valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolenoidState {
    /// Both coils de-energised; the cylinder holds wherever it is.
    #[default]
    Off,
    Forward,
    Reverse,
}

/// A double-acting pneumatic valve.
pub trait Solenoid: Send {
    /// Stable identifier, e.g. `"dump_valve"`.
    fn id(&self) -> &str;

    /// Drive the valve to `state`.
    ///
    /// # Errors
    ///
    /// Returns [`GiganError::HardwareFault`] if the command cannot be applied.
    fn set_state(&mut self, state: SolenoidState) -> Result<(), GiganError>;

    fn state(&self) -> SolenoidState;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockSolenoid {
        id: String,
        state: SolenoidState,
    }

    impl Solenoid for MockSolenoid {
        fn id(&self) -> &str {
            &self.id
        }

        fn set_state(&mut self, state: SolenoidState) -> Result<(), GiganError> {
            self.state = state;
            Ok(())
        }

        fn state(&self) -> SolenoidState {
            self.state
        }
    }

    #[test]
    fn mock_solenoid_toggle() {
        let mut valve = MockSolenoid {
            id: "climb_valve".to_string(),
            state: SolenoidState::default(),
        };
        assert_eq!(valve.id(), "climb_valve");
        assert_eq!(valve.state(), SolenoidState::Off);

        valve.set_state(SolenoidState::Forward).unwrap();
        assert_eq!(valve.state(), SolenoidState::Forward);

        valve.set_state(SolenoidState::Reverse).unwrap();
        assert_eq!(valve.state(), SolenoidState::Reverse);
    }
}
