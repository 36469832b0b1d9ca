//! [`Robot`] – mode handling around the scheduler, hardware and health
//! monitor.
//!
//! The robot is driven by one call to [`Robot::periodic`] per control tick.
//! Mode changes requested through [`Robot::set_mode`] take effect at the
//! next tick boundary:
//!
//! | Transition | Effect |
//! |---|---|
//! | → Autonomous | cancel everything, schedule the configured routine |
//! | → Teleop | cancel the autonomous routine |
//! | → Test | cancel everything |
//! | → Disabled | cancel everything, then drive all mechanisms to safe state |
//!
//! Tasks only run while the robot is enabled (any mode but Disabled).

use std::fmt;
use std::time::Duration;

use gigan_hal::MechanismRegistry;
use gigan_kernel::{AlertState, AlertThresholds, ArbiterSnapshot, HealthMonitor};
use gigan_types::{GiganError, InputSnapshot, TaskId, Telemetry};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::autos::AutoRoutine;
use crate::bindings::{bind_copilot, bind_pilot, register_defaults};
use crate::scheduler::{Scheduler, TaskInfo, TickReport};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

fn default_tick_ms() -> u64 {
    20
}

fn default_deadband() -> f64 {
    0.1
}

/// Robot-level tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Control loop period in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Stick deadband applied to pilot drive axes and the copilot throttle.
    #[serde(default = "default_deadband")]
    pub deadband: f64,
    /// Routine scheduled on entering autonomous.
    #[serde(default)]
    pub auto_routine: AutoRoutine,
    #[serde(default)]
    pub alerts: AlertThresholds,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            deadband: default_deadband(),
            auto_routine: AutoRoutine::default(),
            alerts: AlertThresholds::default(),
        }
    }
}

impl RobotConfig {
    /// Tick period, never shorter than one millisecond.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mode and status
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotMode {
    #[default]
    Disabled,
    Autonomous,
    Teleop,
    Test,
}

impl RobotMode {
    pub fn is_enabled(self) -> bool {
        self != RobotMode::Disabled
    }
}

impl fmt::Display for RobotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RobotMode::Disabled => "disabled",
            RobotMode::Autonomous => "autonomous",
            RobotMode::Teleop => "teleop",
            RobotMode::Test => "test",
        };
        f.write_str(name)
    }
}

/// Snapshot for dashboards and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotStatus {
    pub mode: RobotMode,
    pub uptime_secs: f64,
    pub auto_routine: AutoRoutine,
    pub tasks: Vec<TaskInfo>,
    pub resources: ArbiterSnapshot,
    pub alerts: AlertState,
}

// ─────────────────────────────────────────────────────────────────────────────
// Robot
// ─────────────────────────────────────────────────────────────────────────────

pub struct Robot {
    config: RobotConfig,
    hardware: MechanismRegistry,
    scheduler: Scheduler,
    health: HealthMonitor,
    mode: RobotMode,
    auto_task: Option<TaskId>,
    safe_state_pending: bool,
    last_tick: Duration,
}

impl Robot {
    /// Put the hardware into its safe state and install bindings and
    /// defaults.
    ///
    /// # Errors
    ///
    /// Fails if the hardware rejects its safe state or the default tasks
    /// conflict.
    pub fn new(config: RobotConfig, mut hardware: MechanismRegistry) -> Result<Self, GiganError> {
        hardware.apply_safe_state()?;

        let mut scheduler = Scheduler::new();
        bind_copilot(&mut scheduler, config.deadband);
        bind_pilot(&mut scheduler);
        register_defaults(&mut scheduler, config.deadband)?;

        info!(auto = %config.auto_routine, tick_ms = config.tick_ms, "robot initialised");
        Ok(Self {
            health: HealthMonitor::new(config.alerts.clone()),
            config,
            hardware,
            scheduler,
            mode: RobotMode::Disabled,
            auto_task: None,
            safe_state_pending: false,
            last_tick: Duration::ZERO,
        })
    }

    pub fn mode(&self) -> RobotMode {
        self.mode
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn set_mode(&mut self, mode: RobotMode) {
        if mode == self.mode {
            return;
        }
        info!(from = %self.mode, to = %mode, "mode change");
        match mode {
            RobotMode::Autonomous => {
                self.scheduler.cancel_all();
                let routine = self.config.auto_routine;
                self.auto_task = Some(self.scheduler.schedule(routine.build()));
            }
            RobotMode::Teleop => {
                if let Some(id) = self.auto_task.take() {
                    self.scheduler.cancel(id);
                }
            }
            RobotMode::Test => {
                self.scheduler.cancel_all();
                self.auto_task = None;
            }
            RobotMode::Disabled => {
                self.scheduler.cancel_all();
                self.auto_task = None;
                self.safe_state_pending = true;
            }
        }
        // Re-enabled before the disable tick ran: the tasks own the hardware.
        if mode.is_enabled() {
            self.safe_state_pending = false;
        }
        self.mode = mode;
    }

    /// Run one control tick: scheduler first, then health.
    pub fn periodic(
        &mut self,
        now: Duration,
        input: &InputSnapshot,
        telemetry: &Telemetry,
    ) -> TickReport {
        self.last_tick = now;
        let report = self
            .scheduler
            .tick(&mut self.hardware, input, now, self.mode.is_enabled());

        if self.safe_state_pending {
            self.safe_state_pending = false;
            if let Err(e) = self.hardware.apply_safe_state() {
                warn!(error = %e, "safe state incomplete after disable");
            }
        }

        self.health.update(now, telemetry);
        report
    }

    pub fn status(&self) -> RobotStatus {
        RobotStatus {
            mode: self.mode,
            uptime_secs: self.last_tick.as_secs_f64(),
            auto_routine: self.config.auto_routine,
            tasks: self.scheduler.running(),
            resources: self.scheduler.arbiter_snapshot(),
            alerts: self.health.alerts(),
        }
    }

    pub fn hardware(&self) -> &MechanismRegistry {
        &self.hardware
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }
}
