//! `gigan-kernel` – Arbitration & Health
//!
//! The rules the rest of the robot must not break.
//!
//! # Modules
//!
//! - [`arbiter`] – [`ResourceArbiter`][arbiter::ResourceArbiter]: the
//!   resource → task ownership map.  Answers whether a task may be admitted
//!   and which running tasks it would pre-empt.  Only the scheduler mutates it.
//! - [`health`] – [`HealthMonitor`][health::HealthMonitor]: debounced CAN bus
//!   and low-battery alerts computed from per-tick telemetry, independent of
//!   task scheduling.

pub mod arbiter;
pub mod health;

pub use arbiter::{Admission, ArbiterSnapshot, Claim, ResourceArbiter};
pub use health::{Alert, AlertLevel, AlertState, AlertThresholds, HealthMonitor};
