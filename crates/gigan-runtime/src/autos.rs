//! Autonomous routines.
//!
//! Each routine is a single [`Task`] that sequences its writes by the time
//! elapsed since it started.  The routine to run is picked in
//! [`RobotConfig`][crate::robot::RobotConfig] and scheduled when the robot
//! enters autonomous mode.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use gigan_types::{Action, GiganError, ResourceTag};
use serde::{Deserialize, Serialize};

use crate::layout::{speeds, tag, tags};
use crate::task::{Task, TaskContext, idle};

/// Selectable autonomous routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoRoutine {
    #[default]
    Nothing,
    Dump,
    Intake,
    Shoot,
}

impl AutoRoutine {
    pub const ALL: [AutoRoutine; 4] = [
        AutoRoutine::Nothing,
        AutoRoutine::Dump,
        AutoRoutine::Intake,
        AutoRoutine::Shoot,
    ];

    pub fn build(self) -> Box<dyn Task> {
        match self {
            AutoRoutine::Nothing => idle("auto_nothing").boxed(),
            AutoRoutine::Dump => Box::new(DumpAuto::new()),
            AutoRoutine::Intake => Box::new(IntakeAuto::new()),
            AutoRoutine::Shoot => Box::new(ShootAuto::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AutoRoutine::Nothing => "nothing",
            AutoRoutine::Dump => "dump",
            AutoRoutine::Intake => "intake",
            AutoRoutine::Shoot => "shoot",
        }
    }
}

impl fmt::Display for AutoRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoRoutine {
    type Err = GiganError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|routine| routine.as_str() == wanted)
            .ok_or_else(|| GiganError::Config(format!("unknown auto routine '{s}'")))
    }
}

fn secs(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64()
}

// ─────────────────────────────────────────────────────────────────────────────
// Dump
// ─────────────────────────────────────────────────────────────────────────────

/// Score the preload: extend the dump, retract at 1 s, extend again at
/// 1.5 s to shake loose anything stuck, retract for good at 2 s.
pub struct DumpAuto {
    requirements: [ResourceTag; 1],
}

impl DumpAuto {
    pub fn new() -> Self {
        Self {
            requirements: [tag(tags::DUMP)],
        }
    }
}

impl Default for DumpAuto {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for DumpAuto {
    fn name(&self) -> &str {
        "auto_dump"
    }

    fn requirements(&self) -> &[ResourceTag] {
        &self.requirements
    }

    fn on_tick(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), GiganError> {
        let t = secs(ctx.elapsed());
        let action = if t > 2.0 {
            Action::Retract
        } else if t > 1.5 {
            Action::Extend
        } else if t > 1.0 {
            Action::Retract
        } else {
            Action::Extend
        };
        ctx.apply(&self.requirements[0], action)
    }

    fn on_end(&mut self, ctx: &mut TaskContext<'_>, _interrupted: bool) -> Result<(), GiganError> {
        ctx.apply(&self.requirements[0], Action::Retract)
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        secs(ctx.elapsed()) > 2.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Intake
// ─────────────────────────────────────────────────────────────────────────────

/// Run both intakes for three seconds.
pub struct IntakeAuto {
    requirements: [ResourceTag; 2],
}

impl IntakeAuto {
    pub const RUN_TIME: Duration = Duration::from_secs(3);

    pub fn new() -> Self {
        Self {
            requirements: [tag(tags::INTAKE_FRONT), tag(tags::INTAKE_SUSHI)],
        }
    }

    fn write_all(&self, ctx: &mut TaskContext<'_>, action: Action) -> Result<(), GiganError> {
        for resource in &self.requirements {
            ctx.apply(resource, action.clone())?;
        }
        Ok(())
    }
}

impl Default for IntakeAuto {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for IntakeAuto {
    fn name(&self) -> &str {
        "auto_intake"
    }

    fn requirements(&self) -> &[ResourceTag] {
        &self.requirements
    }

    fn on_tick(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), GiganError> {
        let action = if ctx.elapsed() <= Self::RUN_TIME {
            Action::Forward
        } else {
            Action::Stop
        };
        self.write_all(ctx, action)
    }

    fn on_end(&mut self, ctx: &mut TaskContext<'_>, _interrupted: bool) -> Result<(), GiganError> {
        self.write_all(ctx, Action::Stop)
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        ctx.elapsed() > Self::RUN_TIME
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shoot
// ─────────────────────────────────────────────────────────────────────────────

/// Feed the conveyor, spin the flywheel to full after one second.  Runs
/// until the autonomous period ends.
pub struct ShootAuto {
    requirements: [ResourceTag; 2],
}

impl ShootAuto {
    pub const SPIN_UP_DELAY: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self {
            requirements: [tag(tags::CONVEYOR), tag(tags::FLYWHEEL)],
        }
    }
}

impl Default for ShootAuto {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for ShootAuto {
    fn name(&self) -> &str {
        "auto_shoot"
    }

    fn requirements(&self) -> &[ResourceTag] {
        &self.requirements
    }

    fn on_tick(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), GiganError> {
        let [conveyor, flywheel] = &self.requirements;
        ctx.apply(conveyor, Action::Forward)?;
        let flywheel_action = if ctx.elapsed() >= Self::SPIN_UP_DELAY {
            Action::Speed(speeds::FLYWHEEL_HIGH)
        } else {
            Action::Stop
        };
        ctx.apply(flywheel, flywheel_action)
    }

    fn on_end(&mut self, ctx: &mut TaskContext<'_>, _interrupted: bool) -> Result<(), GiganError> {
        let [conveyor, flywheel] = &self.requirements;
        ctx.apply(conveyor, Action::Stop)?;
        ctx.apply(flywheel, Action::Stop)
    }
}
