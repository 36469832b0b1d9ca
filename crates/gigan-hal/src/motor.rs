//! Generic `Motor` trait for speed-controlled motor controllers.
//!
//! Drivers implement this trait and are grouped into a
//! [`MotorMechanism`][crate::mechanism::MotorMechanism].  The scheduling
//! layer never talks to a driver directly; it only issues
//! [`Action`][gigan_types::Action]s against resource tags.

use gigan_types::GiganError;

/// A duty-cycle controlled motor (brushless controller, PWM speed controller, …).
pub trait Motor: Send {
    /// Stable identifier for this motor, e.g. `"conveyor_left"`.
    fn id(&self) -> &str;

    /// Command the motor to `duty`, a fraction of full output in `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`GiganError::HardwareFault`] if the controller rejects the
    /// command.
    fn set_speed(&mut self, duty: f64) -> Result<(), GiganError>;

    /// The most recently commanded duty cycle.
    fn speed(&self) -> f64;
}
