//! Operator bindings and default tasks.
//!
//! The copilot runs the intake, conveyor, flywheel, dump and climber from a
//! flight stick; the pilot drives.  Input names follow `"<operator>.<control>"`.
//!
//! | Control | Binding |
//! |---|---|
//! | copilot trigger | press: extend dump, release: retract dump |
//! | copilot 3 / 4 | front intake + conveyor, reverse / forward, while held |
//! | copilot 5 / 6 | sushi intake + conveyor, reverse / forward, while held |
//! | copilot 7, 11 | flywheel low, while held |
//! | copilot 9 / 10 | conveyor forward / reverse, while held |
//! | copilot 12 | flywheel normal, while held |
//! | copilot hat up / down | flywheel high / low, while held |
//! | copilot throttle | forward: extend climber, back: retract climber |
//! | pilot A | zero heading |
//! | pilot Y | lock wheels, while held |

use gigan_types::{Action, GiganError, Pov, ResourceTag};

use crate::layout::{speeds, tag, tags};
use crate::scheduler::Scheduler;
use crate::task::{FnTask, TaskFactory, apply_once, factory, hold, hold_all};
use crate::trigger::{BindingKind, Trigger};

/// Input names.
pub mod controls {
    pub const COPILOT_TRIGGER: &str = "copilot.trigger";
    pub const COPILOT_THROTTLE: &str = "copilot.throttle";
    pub const PILOT_A: &str = "pilot.a";
    pub const PILOT_Y: &str = "pilot.y";
    pub const PILOT_LEFT_X: &str = "pilot.left_x";
    pub const PILOT_LEFT_Y: &str = "pilot.left_y";
    pub const PILOT_RIGHT_X: &str = "pilot.right_x";

    /// Numbered copilot stick button.
    pub fn copilot(button: u8) -> String {
        format!("copilot.{button}")
    }
}

/// Zero `value` inside `±deadband` and rescale the rest back onto `[-1, 1]`.
pub fn apply_deadband(value: f64, deadband: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let deadband = deadband.clamp(0.0, 0.99);
    if value.abs() <= deadband {
        return 0.0;
    }
    let scaled = (value.abs() - deadband) / (1.0 - deadband);
    scaled.min(1.0).copysign(value)
}

fn held(name: &'static str, resource: &'static str, action: Action) -> TaskFactory {
    factory(move || hold(name, resource, action.clone()).boxed())
}

fn held_pair(name: &'static str, writes: [(&'static str, Action); 2]) -> TaskFactory {
    factory(move || {
        hold_all(
            name,
            writes
                .iter()
                .map(|(resource, action)| (tag(resource), action.clone()))
                .collect(),
        )
        .boxed()
    })
}

fn once(name: &'static str, resource: &'static str, action: Action) -> TaskFactory {
    factory(move || apply_once(name, resource, action.clone()).boxed())
}

/// Bind the copilot stick.
pub fn bind_copilot(scheduler: &mut Scheduler, throttle_deadband: f64) {
    use BindingKind::{OnFalse, OnTrue, WhileTrue};

    let dump = Trigger::button(controls::COPILOT_TRIGGER);
    scheduler.bind(
        dump.clone(),
        OnTrue,
        held("dump_extend", tags::DUMP, Action::Extend),
    );
    scheduler.bind(
        dump,
        OnFalse,
        held("dump_retract", tags::DUMP, Action::Retract),
    );

    let intake_bindings = [
        (3, "intake_front_out", tags::INTAKE_FRONT, Action::Reverse),
        (4, "intake_front_in", tags::INTAKE_FRONT, Action::Forward),
        (5, "intake_sushi_out", tags::INTAKE_SUSHI, Action::Reverse),
        (6, "intake_sushi_in", tags::INTAKE_SUSHI, Action::Forward),
    ];
    for (button, name, intake, action) in intake_bindings {
        scheduler.bind(
            Trigger::button(controls::copilot(button)),
            WhileTrue,
            held_pair(name, [(intake, action.clone()), (tags::CONVEYOR, action)]),
        );
    }

    scheduler.bind(
        Trigger::button(controls::copilot(7)).or(Trigger::button(controls::copilot(11))),
        WhileTrue,
        held("flywheel_low", tags::FLYWHEEL, Action::Speed(speeds::FLYWHEEL_LOW)),
    );
    scheduler.bind(
        Trigger::button(controls::copilot(9)),
        WhileTrue,
        held("conveyor_forward", tags::CONVEYOR, Action::Forward),
    );
    scheduler.bind(
        Trigger::button(controls::copilot(10)),
        WhileTrue,
        held("conveyor_reverse", tags::CONVEYOR, Action::Reverse),
    );
    scheduler.bind(
        Trigger::button(controls::copilot(12)),
        WhileTrue,
        held(
            "flywheel_normal",
            tags::FLYWHEEL,
            Action::Speed(speeds::FLYWHEEL_NORMAL),
        ),
    );
    scheduler.bind(
        Trigger::pov_any(&[Pov::NorthWest, Pov::North, Pov::NorthEast]),
        WhileTrue,
        held("flywheel_high", tags::FLYWHEEL, Action::Speed(speeds::FLYWHEEL_HIGH)),
    );
    scheduler.bind(
        Trigger::pov_any(&[Pov::SouthEast, Pov::South, Pov::SouthWest]),
        WhileTrue,
        held("flywheel_low", tags::FLYWHEEL, Action::Speed(speeds::FLYWHEEL_LOW)),
    );

    scheduler.bind(
        Trigger::axis_above(controls::COPILOT_THROTTLE, throttle_deadband),
        OnTrue,
        once("climber_extend", tags::CLIMBER, Action::Extend),
    );
    scheduler.bind(
        Trigger::axis_below(controls::COPILOT_THROTTLE, -throttle_deadband),
        OnTrue,
        once("climber_retract", tags::CLIMBER, Action::Retract),
    );
}

/// Bind the pilot controller.
pub fn bind_pilot(scheduler: &mut Scheduler) {
    scheduler.bind(
        Trigger::button(controls::PILOT_A),
        BindingKind::OnTrue,
        once("zero_heading", tags::DRIVEBASE, Action::ZeroHeading),
    );
    scheduler.bind(
        Trigger::button(controls::PILOT_Y),
        BindingKind::WhileTrue,
        held("lock_wheels", tags::DRIVEBASE, Action::Lock),
    );
}

/// Field-relative teleop drive from the pilot sticks.  Stick forward is
/// negative on the controller, so every axis is negated.
pub fn teleop_drive(deadband: f64) -> FnTask {
    let drivebase = ResourceTag::new(tags::DRIVEBASE);
    FnTask::new("teleop_drive")
        .requires(drivebase.clone())
        .on_tick(move |ctx| {
            let input = ctx.input();
            let vx = -apply_deadband(input.axis(controls::PILOT_LEFT_Y), deadband);
            let vy = -apply_deadband(input.axis(controls::PILOT_LEFT_X), deadband);
            let omega = -apply_deadband(input.axis(controls::PILOT_RIGHT_X), deadband);
            ctx.apply(&drivebase, Action::Drive { vx, vy, omega })
        })
}

/// Register the default task for every motor resource and the drivebase.
///
/// # Errors
///
/// Propagates [`GiganError::Config`] from the scheduler.
pub fn register_defaults(scheduler: &mut Scheduler, deadband: f64) -> Result<(), GiganError> {
    scheduler.set_default_task(factory(move || teleop_drive(deadband).boxed()))?;
    for (name, resource) in [
        ("intake_front_stop", tags::INTAKE_FRONT),
        ("intake_sushi_stop", tags::INTAKE_SUSHI),
        ("conveyor_stop", tags::CONVEYOR),
        ("flywheel_stop", tags::FLYWHEEL),
    ] {
        scheduler.set_default_task(held(name, resource, Action::Stop))?;
    }
    Ok(())
}
