//! [`HealthMonitor`] – debounced hardware alerts.
//!
//! Two independent detectors run once per tick against the latest
//! [`Telemetry`]:
//!
//! - **Bus errors** – the alert is active while at least the warm-up period
//!   has passed since startup *and* a CAN error counter increased less than
//!   the alert window ago.  The warm-up swallows the burst of errors seen
//!   while links come up; the window makes the alert clear itself once errors
//!   stop.
//! - **Low supply** – the alert is active while the battery reads below the
//!   threshold *and* the robot has been disabled for at least the debounce
//!   period.  Sag under load while enabled never trips it.
//!
//! All timing is driven by the caller-supplied `now` (time since startup), so
//! the monitor is fully deterministic under test.  A missing reading holds the
//! affected alert where it was.

use std::time::Duration;

use gigan_types::{BusStatus, Telemetry};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Tunables for the alert detectors.  Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    #[serde(default = "default_bus_window")]
    pub bus_warm_up_secs: f64,
    #[serde(default = "default_bus_window")]
    pub bus_alert_window_secs: f64,
    #[serde(default = "default_low_battery_volts")]
    pub low_battery_volts: f64,
    #[serde(default = "default_low_battery_debounce")]
    pub low_battery_debounce_secs: f64,
}

fn default_bus_window() -> f64 {
    0.5
}
fn default_low_battery_volts() -> f64 {
    11.0
}
fn default_low_battery_debounce() -> f64 {
    2.0
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            bus_warm_up_secs: default_bus_window(),
            bus_alert_window_secs: default_bus_window(),
            low_battery_volts: default_low_battery_volts(),
            low_battery_debounce_secs: default_low_battery_debounce(),
        }
    }
}

fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Alerts
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Error,
    Warning,
    Info,
}

/// A named operator-facing alert flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub name: &'static str,
    pub message: &'static str,
    pub level: AlertLevel,
    pub active: bool,
}

impl Alert {
    pub const fn new(name: &'static str, message: &'static str, level: AlertLevel) -> Self {
        Self {
            name,
            message,
            level,
            active: false,
        }
    }

    /// Update the flag, logging on every transition.  Returns `true` if the
    /// flag changed.
    pub fn set(&mut self, active: bool) -> bool {
        if self.active == active {
            return false;
        }
        self.active = active;
        match (active, self.level) {
            (true, AlertLevel::Error) => error!(alert = self.name, "{}", self.message),
            (true, AlertLevel::Warning) => warn!(alert = self.name, "{}", self.message),
            (true, AlertLevel::Info) => info!(alert = self.name, "{}", self.message),
            (false, _) => info!(alert = self.name, "alert cleared"),
        }
        true
    }
}

/// Read-only copy of every alert, published to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertState {
    pub alerts: Vec<Alert>,
}

impl AlertState {
    pub fn is_active(&self, name: &str) -> bool {
        self.alerts.iter().any(|a| a.name == name && a.active)
    }

    pub fn active(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.active)
    }
}

pub const BUS_ERROR_ALERT: &str = "bus_error";
pub const LOW_BATTERY_ALERT: &str = "low_battery";

// ────────────────────────────────────────────────────────────────────────────
// Detectors
// ────────────────────────────────────────────────────────────────────────────

/// Hysteresis over the CAN error counters.
#[derive(Debug, Clone)]
pub struct BusErrorDetector {
    warm_up: Duration,
    window: Duration,
    previous: Option<BusStatus>,
    last_error_at: Duration,
}

impl BusErrorDetector {
    pub fn new(warm_up: Duration, window: Duration) -> Self {
        Self {
            warm_up,
            window,
            previous: None,
            // The since-error timer starts with the process.
            last_error_at: Duration::ZERO,
        }
    }

    /// Feed one sample.  Returns the new alert level, or `None` when the
    /// counters could not be read.
    pub fn update(&mut self, now: Duration, bus: Option<BusStatus>) -> Option<bool> {
        let status = bus?;
        if let Some(prev) = self.previous {
            // A decrease is a counter reset or wrap, not an error.
            if status.rx_errors > prev.rx_errors || status.tx_errors > prev.tx_errors {
                self.last_error_at = now;
            }
        }
        self.previous = Some(status);

        let warmed_up = now >= self.warm_up;
        let recent_error = now.saturating_sub(self.last_error_at) < self.window;
        Some(warmed_up && recent_error)
    }
}

/// Debounced low-battery detection while disabled.
#[derive(Debug, Clone)]
pub struct LowSupplyDetector {
    threshold_volts: f64,
    debounce: Duration,
    last_enabled_at: Duration,
}

impl LowSupplyDetector {
    pub fn new(threshold_volts: f64, debounce: Duration) -> Self {
        Self {
            threshold_volts,
            debounce,
            last_enabled_at: Duration::ZERO,
        }
    }

    /// Feed one sample.  The enabled timer always advances; the alert level
    /// is `None` when the voltage could not be read.
    pub fn update(&mut self, now: Duration, voltage: Option<f64>, enabled: bool) -> Option<bool> {
        if enabled {
            self.last_enabled_at = now;
        }
        let volts = voltage.filter(|v| v.is_finite())?;
        let disabled_for = now.saturating_sub(self.last_enabled_at);
        Some(volts < self.threshold_volts && disabled_for >= self.debounce)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HealthMonitor
// ────────────────────────────────────────────────────────────────────────────

/// Owns both detectors and the alert flags they drive.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gigan_kernel::health::{AlertThresholds, HealthMonitor, LOW_BATTERY_ALERT};
/// use gigan_types::Telemetry;
///
/// let mut monitor = HealthMonitor::new(AlertThresholds::default());
/// let sagging = Telemetry { bus: None, supply_voltage: Some(10.5), enabled: false };
///
/// monitor.update(Duration::from_millis(1_980), &sagging);
/// assert!(!monitor.alerts().is_active(LOW_BATTERY_ALERT));
/// monitor.update(Duration::from_millis(2_000), &sagging);
/// assert!(monitor.alerts().is_active(LOW_BATTERY_ALERT));
/// ```
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    bus: BusErrorDetector,
    supply: LowSupplyDetector,
    bus_alert: Alert,
    battery_alert: Alert,
}

impl HealthMonitor {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            bus: BusErrorDetector::new(
                secs(thresholds.bus_warm_up_secs),
                secs(thresholds.bus_alert_window_secs),
            ),
            supply: LowSupplyDetector::new(
                thresholds.low_battery_volts,
                secs(thresholds.low_battery_debounce_secs),
            ),
            bus_alert: Alert::new(
                BUS_ERROR_ALERT,
                "CAN bus error! Check the CAN bus connections and power cycle the robot. \
                 Robot may be uncontrollable!",
                AlertLevel::Error,
            ),
            battery_alert: Alert::new(
                LOW_BATTERY_ALERT,
                "Low battery! Charge the robot or swap in a charged battery. \
                 Robot may brown out and become uncontrollable!",
                AlertLevel::Warning,
            ),
        }
    }

    /// Sample `telemetry` at time `now` (since startup).
    pub fn update(&mut self, now: Duration, telemetry: &Telemetry) {
        if let Some(active) = self.bus.update(now, telemetry.bus) {
            self.bus_alert.set(active);
        }
        if let Some(active) =
            self.supply
                .update(now, telemetry.supply_voltage, telemetry.enabled)
        {
            self.battery_alert.set(active);
        }
    }

    pub fn bus_alert_active(&self) -> bool {
        self.bus_alert.active
    }

    pub fn low_battery_active(&self) -> bool {
        self.battery_alert.active
    }

    pub fn alerts(&self) -> AlertState {
        AlertState {
            alerts: vec![self.bus_alert.clone(), self.battery_alert.clone()],
        }
    }
}
