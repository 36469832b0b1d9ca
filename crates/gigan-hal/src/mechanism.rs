//! [`Mechanism`] – named actuator capability addressed by resource tag.
//!
//! A mechanism exclusively owns one or more [`ResourceTag`]s and maps an
//! abstract [`Action`] onto the driver writes for that tag.  `apply` is a
//! pure function of the action: applying the same action twice leaves the
//! hardware in the same state as applying it once.

use gigan_types::{Action, GiganError, ResourceTag};

use crate::chassis::Chassis;
use crate::motor::Motor;
use crate::solenoid::{Solenoid, SolenoidState};

/// A physical mechanism the scheduler can command.
pub trait Mechanism: Send {
    fn name(&self) -> &str;

    /// Resource tags this mechanism exclusively owns.
    fn resources(&self) -> &[ResourceTag];

    /// Translate `action` into hardware writes for `resource`.
    ///
    /// # Errors
    ///
    /// - [`GiganError::UnknownResource`] if `resource` is not owned here.
    /// - [`GiganError::UnsupportedAction`] if the action makes no sense for
    ///   this kind of mechanism.
    /// - Any driver error.
    fn apply(&mut self, resource: &ResourceTag, action: &Action) -> Result<(), GiganError>;

    /// The last action successfully applied to `resource`.
    fn last_action(&self, resource: &ResourceTag) -> Option<&Action>;

    /// The idle action `resource` is put into at startup and on disable.
    fn safe_action(&self, resource: &ResourceTag) -> Action;
}

fn unsupported(component: &str, action: &Action) -> GiganError {
    GiganError::UnsupportedAction {
        component: component.to_string(),
        action: action.clone(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Motor groups
// ─────────────────────────────────────────────────────────────────────────────

struct MotorChannel {
    nominal: f64,
    motors: Vec<Box<dyn Motor>>,
    last: Option<Action>,
}

/// One or more motor groups, each addressed by its own resource tag and
/// driven together at a shared duty cycle.
///
/// `Forward` / `Reverse` run the group at its nominal speed, `Speed(x)` at an
/// explicit duty cycle.
pub struct MotorMechanism {
    name: String,
    resources: Vec<ResourceTag>,
    channels: Vec<MotorChannel>,
}

impl MotorMechanism {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            channels: Vec::new(),
        }
    }

    /// Add a motor group under `resource` with the given nominal duty cycle.
    pub fn with_group(
        mut self,
        resource: impl Into<ResourceTag>,
        nominal: f64,
        motors: Vec<Box<dyn Motor>>,
    ) -> Self {
        self.resources.push(resource.into());
        self.channels.push(MotorChannel {
            nominal,
            motors,
            last: None,
        });
        self
    }

    fn channel_index(&self, resource: &ResourceTag) -> Result<usize, GiganError> {
        self.resources
            .iter()
            .position(|r| r == resource)
            .ok_or_else(|| GiganError::UnknownResource(resource.clone()))
    }
}

impl Mechanism for MotorMechanism {
    fn name(&self) -> &str {
        &self.name
    }

    fn resources(&self) -> &[ResourceTag] {
        &self.resources
    }

    fn apply(&mut self, resource: &ResourceTag, action: &Action) -> Result<(), GiganError> {
        let idx = self.channel_index(resource)?;
        let channel = &mut self.channels[idx];
        let duty = match action {
            Action::Stop => 0.0,
            Action::Forward => channel.nominal,
            Action::Reverse => -channel.nominal,
            Action::Speed(duty) if duty.is_finite() => duty.clamp(-1.0, 1.0),
            Action::Speed(_) => 0.0,
            other => return Err(unsupported(&self.name, other)),
        };
        for motor in &mut channel.motors {
            motor.set_speed(duty)?;
        }
        channel.last = Some(action.clone());
        Ok(())
    }

    fn last_action(&self, resource: &ResourceTag) -> Option<&Action> {
        let idx = self.channel_index(resource).ok()?;
        self.channels[idx].last.as_ref()
    }

    fn safe_action(&self, _resource: &ResourceTag) -> Action {
        Action::Stop
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pneumatics
// ─────────────────────────────────────────────────────────────────────────────

/// A double-acting cylinder behind a single resource tag.
pub struct PneumaticMechanism {
    name: String,
    resources: [ResourceTag; 1],
    solenoid: Box<dyn Solenoid>,
    safe: Action,
    last: Option<Action>,
}

impl PneumaticMechanism {
    /// `safe` must be `Extend`, `Retract` or `Stop`.
    pub fn new(
        name: impl Into<String>,
        resource: impl Into<ResourceTag>,
        solenoid: Box<dyn Solenoid>,
        safe: Action,
    ) -> Self {
        Self {
            name: name.into(),
            resources: [resource.into()],
            solenoid,
            safe,
            last: None,
        }
    }

    /// `true` when the cylinder was last commanded out.
    pub fn is_extended(&self) -> bool {
        self.solenoid.state() == SolenoidState::Forward
    }
}

impl Mechanism for PneumaticMechanism {
    fn name(&self) -> &str {
        &self.name
    }

    fn resources(&self) -> &[ResourceTag] {
        &self.resources
    }

    fn apply(&mut self, resource: &ResourceTag, action: &Action) -> Result<(), GiganError> {
        if resource != &self.resources[0] {
            return Err(GiganError::UnknownResource(resource.clone()));
        }
        let state = match action {
            Action::Extend => SolenoidState::Forward,
            Action::Retract => SolenoidState::Reverse,
            Action::Stop => SolenoidState::Off,
            other => return Err(unsupported(&self.name, other)),
        };
        self.solenoid.set_state(state)?;
        self.last = Some(action.clone());
        Ok(())
    }

    fn last_action(&self, resource: &ResourceTag) -> Option<&Action> {
        (resource == &self.resources[0])
            .then_some(self.last.as_ref())
            .flatten()
    }

    fn safe_action(&self, _resource: &ResourceTag) -> Action {
        self.safe.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Drivebase
// ─────────────────────────────────────────────────────────────────────────────

/// Adapts an external [`Chassis`] controller to the mechanism contract.
pub struct DrivebaseMechanism {
    resources: [ResourceTag; 1],
    chassis: Box<dyn Chassis>,
    last: Option<Action>,
}

impl DrivebaseMechanism {
    pub fn new(resource: impl Into<ResourceTag>, chassis: Box<dyn Chassis>) -> Self {
        Self {
            resources: [resource.into()],
            chassis,
            last: None,
        }
    }
}

impl Mechanism for DrivebaseMechanism {
    fn name(&self) -> &str {
        self.chassis.id()
    }

    fn resources(&self) -> &[ResourceTag] {
        &self.resources
    }

    fn apply(&mut self, resource: &ResourceTag, action: &Action) -> Result<(), GiganError> {
        if resource != &self.resources[0] {
            return Err(GiganError::UnknownResource(resource.clone()));
        }
        match action {
            Action::Stop => self.chassis.drive(0.0, 0.0, 0.0)?,
            Action::Drive { vx, vy, omega } => self.chassis.drive(*vx, *vy, *omega)?,
            Action::Lock => self.chassis.lock()?,
            Action::ZeroHeading => self.chassis.zero_heading()?,
            other => return Err(unsupported(self.chassis.id(), other)),
        }
        self.last = Some(action.clone());
        Ok(())
    }

    fn last_action(&self, resource: &ResourceTag) -> Option<&Action> {
        (resource == &self.resources[0])
            .then_some(self.last.as_ref())
            .flatten()
    }

    fn safe_action(&self, _resource: &ResourceTag) -> Action {
        Action::Stop
    }
}
