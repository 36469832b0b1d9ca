//! `gigan-hal` – Mechanism Boundary
//!
//! Driver traits for the vendor hardware and the [`Mechanism`] layer the
//! scheduler writes through.
//!
//! # Modules
//!
//! - [`motor`], [`solenoid`], [`chassis`] – driver traits implemented by the
//!   vendor SDK bindings (or by [`sim`] stubs).
//! - [`mechanism`] – [`Mechanism`] plus the three concrete mechanism kinds:
//!   motor groups, double-acting cylinders and the drivebase adapter.
//! - [`registry`] – [`MechanismRegistry`]: routes `apply(resource, action)`
//!   to the owning mechanism and drives everything to its safe state.
//! - [`sim`] – recording stubs for headless runs and tests.

pub mod chassis;
pub mod mechanism;
pub mod motor;
pub mod registry;
pub mod sim;
pub mod solenoid;

pub use chassis::Chassis;
pub use mechanism::{DrivebaseMechanism, Mechanism, MotorMechanism, PneumaticMechanism};
pub use motor::Motor;
pub use registry::MechanismRegistry;
pub use solenoid::{Solenoid, SolenoidState};
