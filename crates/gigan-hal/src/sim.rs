//! In-process simulated drivers for running the full control stack without
//! a robot.
//!
//! Every stub records the last command it received and, when given a
//! [`Journal`], appends a line per hardware write so tests can assert on the
//! exact order of writes across devices.
//!
//! # Example
//!
//! ```rust
//! use gigan_hal::mechanism::{Mechanism, MotorMechanism};
//! use gigan_hal::sim::{Journal, SimMotor};
//! use gigan_types::{Action, ResourceTag};
//!
//! let journal = Journal::default();
//! let mut conveyor = MotorMechanism::new("conveyor").with_group(
//!     "conveyor",
//!     0.38,
//!     vec![SimMotor::new("conveyor_left").with_journal(journal.clone())],
//! );
//!
//! conveyor
//!     .apply(&ResourceTag::new("conveyor"), &Action::Forward)
//!     .expect("sim motor must accept commands");
//! assert_eq!(journal.entries(), vec!["conveyor_left=0.38".to_string()]);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use gigan_types::GiganError;

use crate::chassis::Chassis;
use crate::motor::Motor;
use crate::solenoid::{Solenoid, SolenoidState};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not hide the journal from the others.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ────────────────────────────────────────────────────────────────────────────
// Journal
// ────────────────────────────────────────────────────────────────────────────

/// Shared, append-only log of simulated hardware writes.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.0).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    pub fn clear(&self) {
        lock(&self.0).clear();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub motor
// ────────────────────────────────────────────────────────────────────────────

/// A simulated motor that records the most recent duty cycle.  Always succeeds.
pub struct SimMotor {
    id: String,
    duty: f64,
    journal: Option<Journal>,
}

impl SimMotor {
    pub fn new(id: impl Into<String>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            duty: 0.0,
            journal: None,
        })
    }

    pub fn with_journal(mut self: Box<Self>, journal: Journal) -> Box<Self> {
        self.journal = Some(journal);
        self
    }
}

impl Motor for SimMotor {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_speed(&mut self, duty: f64) -> Result<(), GiganError> {
        self.duty = duty;
        if let Some(journal) = &self.journal {
            journal.record(format!("{}={}", self.id, duty));
        }
        Ok(())
    }

    fn speed(&self) -> f64 {
        self.duty
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub solenoid
// ────────────────────────────────────────────────────────────────────────────

/// A simulated double solenoid.  Always succeeds.
pub struct SimSolenoid {
    id: String,
    state: SolenoidState,
    journal: Option<Journal>,
}

impl SimSolenoid {
    pub fn new(id: impl Into<String>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            state: SolenoidState::Off,
            journal: None,
        })
    }

    pub fn with_journal(mut self: Box<Self>, journal: Journal) -> Box<Self> {
        self.journal = Some(journal);
        self
    }
}

impl Solenoid for SimSolenoid {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_state(&mut self, state: SolenoidState) -> Result<(), GiganError> {
        self.state = state;
        if let Some(journal) = &self.journal {
            journal.record(format!("{}={:?}", self.id, state));
        }
        Ok(())
    }

    fn state(&self) -> SolenoidState {
        self.state
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub chassis
// ────────────────────────────────────────────────────────────────────────────

/// Observable state of a [`SimChassis`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisState {
    pub velocity: (f64, f64, f64),
    pub locked: bool,
    pub heading_resets: u32,
}

/// Read handle onto a [`SimChassis`] that stays valid after the chassis is
/// moved into a registry.
#[derive(Debug, Clone, Default)]
pub struct ChassisProbe(Arc<Mutex<ChassisState>>);

impl ChassisProbe {
    pub fn snapshot(&self) -> ChassisState {
        *lock(&self.0)
    }
}

/// A simulated swerve chassis.  Always succeeds.
pub struct SimChassis {
    id: String,
    state: ChassisProbe,
    journal: Option<Journal>,
}

impl SimChassis {
    pub fn new(id: impl Into<String>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            state: ChassisProbe::default(),
            journal: None,
        })
    }

    pub fn with_journal(mut self: Box<Self>, journal: Journal) -> Box<Self> {
        self.journal = Some(journal);
        self
    }

    pub fn probe(&self) -> ChassisProbe {
        self.state.clone()
    }

    fn log(&self, entry: String) {
        if let Some(journal) = &self.journal {
            journal.record(entry);
        }
    }
}

impl Chassis for SimChassis {
    fn id(&self) -> &str {
        &self.id
    }

    fn drive(&mut self, vx: f64, vy: f64, omega: f64) -> Result<(), GiganError> {
        {
            let mut state = lock(&self.state.0);
            state.velocity = (vx, vy, omega);
            state.locked = false;
        }
        self.log(format!("{}=drive({vx},{vy},{omega})", self.id));
        Ok(())
    }

    fn lock(&mut self) -> Result<(), GiganError> {
        {
            let mut state = lock(&self.state.0);
            state.velocity = (0.0, 0.0, 0.0);
            state.locked = true;
        }
        self.log(format!("{}=lock", self.id));
        Ok(())
    }

    fn zero_heading(&mut self) -> Result<(), GiganError> {
        lock(&self.state.0).heading_resets += 1;
        self.log(format!("{}=zero_heading", self.id));
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
