//! External chassis controller boundary.
//!
//! The swerve kinematics live in a vendor library; this crate only needs the
//! three calls the operator bindings use.

use gigan_types::GiganError;

/// A drivetrain whose kinematics are handled elsewhere.
pub trait Chassis: Send {
    fn id(&self) -> &str;

    /// Request a field-relative velocity, each component a fraction of the
    /// chassis maximum in `[-1, 1]`.
    fn drive(&mut self, vx: f64, vy: f64, omega: f64) -> Result<(), GiganError>;

    /// Lock the modules in an X pattern.
    fn lock(&mut self) -> Result<(), GiganError>;

    /// Reset the gyro so the current heading becomes zero.
    fn zero_heading(&mut self) -> Result<(), GiganError>;
}
