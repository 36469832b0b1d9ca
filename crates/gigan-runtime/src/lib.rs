//! `gigan-runtime` – Scheduler & Robot
//!
//! The cooperative control loop and everything that runs on it.
//!
//! # Modules
//!
//! - [`task`] – the [`Task`][task::Task] lifecycle trait, the
//!   [`TaskContext`][task::TaskContext] tasks write hardware through, and
//!   closure-built tasks.
//! - [`trigger`] – [`Trigger`][trigger::Trigger] predicates over the input
//!   snapshot and edge detection.
//! - [`scheduler`] – [`Scheduler`][scheduler::Scheduler]: one tick =
//!   requests, triggers, admission, defaults, execute, retire.  Faults stay
//!   inside the task that raised them.
//! - [`layout`] – resource tags, nominal speeds and the simulated wiring.
//! - [`bindings`] – copilot and pilot controls and per-resource defaults.
//! - [`autos`] – autonomous routines.
//! - [`robot`] – [`Robot`][robot::Robot]: modes, per-tick driving of the
//!   scheduler and the [`HealthMonitor`][gigan_kernel::HealthMonitor],
//!   status snapshots.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing] with optional
//!   OTLP export.

pub mod autos;
pub mod bindings;
pub mod layout;
pub mod robot;
pub mod scheduler;
pub mod task;
pub mod telemetry;
pub mod trigger;

pub use autos::AutoRoutine;
pub use robot::{Robot, RobotConfig, RobotMode, RobotStatus};
pub use scheduler::{Scheduler, TaskInfo, TickReport};
pub use task::{FnTask, Task, TaskContext, TaskFactory, TaskState};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use trigger::{BindingKind, Trigger};
