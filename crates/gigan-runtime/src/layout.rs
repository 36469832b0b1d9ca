//! Robot layout: resource tags, nominal speeds and the simulated hardware
//! wiring.
//!
//! Every mechanism on the robot is addressed through one of the tags in
//! [`tags`].  Tasks and bindings only ever name tags; which motor or
//! solenoid sits behind a tag is decided here.

use gigan_hal::motor::Motor;
use gigan_hal::sim::{ChassisProbe, Journal, SimChassis, SimMotor, SimSolenoid};
use gigan_hal::solenoid::Solenoid;
use gigan_hal::{DrivebaseMechanism, MechanismRegistry, MotorMechanism, PneumaticMechanism};
use gigan_types::{Action, GiganError, ResourceTag};

/// Resource tag names.
pub mod tags {
    pub const INTAKE_FRONT: &str = "intake.front";
    pub const INTAKE_SUSHI: &str = "intake.sushi";
    pub const CONVEYOR: &str = "conveyor";
    pub const FLYWHEEL: &str = "flywheel";
    pub const DUMP: &str = "dump";
    pub const CLIMBER: &str = "climber";
    pub const DRIVEBASE: &str = "drivebase";

    pub const ALL: [&str; 7] = [
        INTAKE_FRONT,
        INTAKE_SUSHI,
        CONVEYOR,
        FLYWHEEL,
        DUMP,
        CLIMBER,
        DRIVEBASE,
    ];
}

/// Nominal duty cycles.
pub mod speeds {
    pub const INTAKE_FRONT: f64 = 0.2;
    pub const INTAKE_SUSHI: f64 = 0.8;
    pub const CONVEYOR: f64 = 0.38;
    pub const FLYWHEEL_LOW: f64 = 0.15;
    pub const FLYWHEEL_NORMAL: f64 = 0.25;
    pub const FLYWHEEL_HIGH: f64 = 1.0;
}

pub fn tag(name: &str) -> ResourceTag {
    ResourceTag::new(name)
}

/// Simulated robot hardware plus a read handle onto the chassis.
pub struct SimHardware {
    pub registry: MechanismRegistry,
    pub chassis: ChassisProbe,
}

fn sim_motor(id: &str, journal: Option<&Journal>) -> Box<dyn Motor> {
    let motor = SimMotor::new(id);
    match journal {
        Some(journal) => motor.with_journal(journal.clone()),
        None => motor,
    }
}

fn sim_solenoid(id: &str, journal: Option<&Journal>) -> Box<dyn Solenoid> {
    let solenoid = SimSolenoid::new(id);
    match journal {
        Some(journal) => solenoid.with_journal(journal.clone()),
        None => solenoid,
    }
}

/// Wire the robot's mechanisms onto simulated drivers.  When `journal` is
/// given every hardware write is recorded to it.
///
/// # Errors
///
/// [`GiganError::Config`] if two mechanisms claim the same tag.
pub fn sim_hardware(journal: Option<&Journal>) -> Result<SimHardware, GiganError> {
    let mut registry = MechanismRegistry::new();

    registry.register(Box::new(
        MotorMechanism::new("intake")
            .with_group(
                tags::INTAKE_FRONT,
                speeds::INTAKE_FRONT,
                vec![sim_motor("intake_front", journal)],
            )
            .with_group(
                tags::INTAKE_SUSHI,
                speeds::INTAKE_SUSHI,
                vec![sim_motor("intake_sushi", journal)],
            ),
    ))?;
    registry.register(Box::new(MotorMechanism::new("conveyor").with_group(
        tags::CONVEYOR,
        speeds::CONVEYOR,
        vec![
            sim_motor("conveyor_left", journal),
            sim_motor("conveyor_right", journal),
        ],
    )))?;
    registry.register(Box::new(MotorMechanism::new("flywheel").with_group(
        tags::FLYWHEEL,
        speeds::FLYWHEEL_NORMAL,
        vec![
            sim_motor("flywheel_left", journal),
            sim_motor("flywheel_right", journal),
        ],
    )))?;
    registry.register(Box::new(PneumaticMechanism::new(
        "dump",
        tags::DUMP,
        sim_solenoid("dump", journal),
        Action::Retract,
    )))?;
    registry.register(Box::new(PneumaticMechanism::new(
        "climber",
        tags::CLIMBER,
        sim_solenoid("climber", journal),
        Action::Retract,
    )))?;

    let chassis = SimChassis::new("swerve");
    let probe = chassis.probe();
    let chassis = match journal {
        Some(journal) => chassis.with_journal(journal.clone()),
        None => chassis,
    };
    registry.register(Box::new(DrivebaseMechanism::new(tags::DRIVEBASE, chassis)))?;

    Ok(SimHardware {
        registry,
        chassis: probe,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_is_wired() {
        let hw = sim_hardware(None).unwrap();
        for name in tags::ALL {
            assert!(hw.registry.contains(&tag(name)), "{name} is not wired");
        }
        assert_eq!(hw.registry.resources().count(), tags::ALL.len());
    }

    #[test]
    fn journal_sees_both_conveyor_motors() {
        let journal = Journal::default();
        let mut hw = sim_hardware(Some(&journal)).unwrap();
        hw.registry
            .apply(&tag(tags::CONVEYOR), &Action::Reverse)
            .unwrap();
        assert_eq!(
            journal.entries(),
            vec!["conveyor_left=-0.38".to_string(), "conveyor_right=-0.38".to_string()]
        );
    }

    #[test]
    fn safe_state_retracts_pneumatics() {
        let journal = Journal::default();
        let mut hw = sim_hardware(Some(&journal)).unwrap();
        hw.registry.apply_safe_state().unwrap();
        let entries = journal.entries();
        assert!(entries.contains(&"climber=Reverse".to_string()));
        assert!(entries.contains(&"dump=Reverse".to_string()));
        assert_eq!(hw.chassis.snapshot().velocity, (0.0, 0.0, 0.0));
    }
}
