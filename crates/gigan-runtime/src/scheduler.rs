//! [`Scheduler`] – the single-threaded cooperative tick loop.
//!
//! The scheduler owns the [`ResourceArbiter`], the running-task set, the
//! trigger bindings and the per-resource default tasks.  Every call to
//! [`Scheduler::tick`] performs, in order:
//!
//! 0. **Requests** – apply cancellations queued since the last tick.
//!    Interrupted tasks get `on_end(true)` before anything else happens.
//! 1. **Triggers** – evaluate every binding's trigger once against the input
//!    snapshot and collect the edges.
//! 2. **Admission** – programmatic schedule requests first, then triggered
//!    bindings in registration order.  Each admission interrupts conflicting
//!    holders (`on_end(true)`) before the new task's `on_start`.
//! 3. **Defaults** – a default task is admitted for each group of resources
//!    that is still unowned.
//! 4. **Execute** – `on_tick` for every running task in admission order.
//! 5. **Retire** – tasks whose `is_finished` is true, or whose while-held
//!    trigger went false, get `on_end(false)` and release their resources
//!    for the next tick.
//!
//! A fault in any callback retires only the faulting task.  The loop itself
//! never stops.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use gigan_hal::{MechanismRegistry, PneumaticMechanism};
//! use gigan_hal::sim::SimSolenoid;
//! use gigan_runtime::scheduler::Scheduler;
//! use gigan_runtime::task::{factory, hold};
//! use gigan_runtime::trigger::{BindingKind, Trigger};
//! use gigan_types::{Action, InputSnapshot, ResourceTag};
//!
//! let mut hardware = MechanismRegistry::new();
//! hardware
//!     .register(Box::new(PneumaticMechanism::new(
//!         "dump",
//!         "dump",
//!         SimSolenoid::new("dump"),
//!         Action::Retract,
//!     )))
//!     .unwrap();
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.bind(
//!     Trigger::button("copilot.trigger"),
//!     BindingKind::WhileTrue,
//!     factory(|| hold("dump_extend", "dump", Action::Extend).boxed()),
//! );
//!
//! let pressed = InputSnapshot::new().with_button("copilot.trigger", true);
//! let report = scheduler.tick(&mut hardware, &pressed, Duration::ZERO, true);
//! assert_eq!(report.started, vec!["dump_extend".to_string()]);
//! assert_eq!(
//!     hardware.last_action(&ResourceTag::new("dump")),
//!     Some(&Action::Extend)
//! );
//! ```

use std::time::Duration;

use gigan_hal::MechanismRegistry;
use gigan_kernel::{Admission, ArbiterSnapshot, ResourceArbiter};
use gigan_types::{GiganError, InputSnapshot, Priority, ResourceTag, TaskId};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::task::{Task, TaskContext, TaskFactory, TaskState};
use crate::trigger::{BindingKind, Edge, EdgeDetector, Trigger};

// ─────────────────────────────────────────────────────────────────────────────
// Bookkeeping types
// ─────────────────────────────────────────────────────────────────────────────

struct ScheduledTask {
    id: TaskId,
    name: String,
    requirements: Vec<ResourceTag>,
    priority: Priority,
    started_at: Duration,
    state: TaskState,
    task: Box<dyn Task>,
}

impl ScheduledTask {
    fn new(task: Box<dyn Task>, priority: Option<Priority>) -> Self {
        let mut requirements: Vec<ResourceTag> = Vec::new();
        for tag in task.requirements() {
            if !requirements.contains(tag) {
                requirements.push(tag.clone());
            }
        }
        Self {
            id: TaskId::new(),
            name: task.name().to_string(),
            requirements,
            priority: priority.unwrap_or_else(|| task.priority()),
            started_at: Duration::ZERO,
            state: TaskState::Pending,
            task,
        }
    }
}

struct Binding {
    trigger: Trigger,
    kind: BindingKind,
    factory: TaskFactory,
    edges: EdgeDetector,
    instance: Option<TaskId>,
}

struct DefaultSlot {
    requirements: Vec<ResourceTag>,
    factory: TaskFactory,
    /// The instance built at registration, used for the first admission.
    spare: Option<Box<dyn Task>>,
    instance: Option<TaskId>,
}

enum Request {
    Schedule(ScheduledTask),
    Cancel(TaskId),
    CancelAll,
}

/// Borrowed per-tick environment handed to task callbacks.
struct Env<'a> {
    hardware: &'a mut MechanismRegistry,
    input: &'a InputSnapshot,
    now: Duration,
}

/// What happened during one tick, by task name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub started: Vec<String>,
    pub interrupted: Vec<String>,
    pub finished: Vec<String>,
    pub faulted: Vec<String>,
    pub rejected: Vec<String>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.started.is_empty()
            && self.interrupted.is_empty()
            && self.finished.is_empty()
            && self.faulted.is_empty()
            && self.rejected.is_empty()
    }
}

/// Read-only view of one running task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: String,
    pub resources: Vec<ResourceTag>,
    pub priority: Priority,
    pub started_at_secs: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Scheduler {
    arbiter: ResourceArbiter,
    /// Running tasks in admission order.
    running: Vec<ScheduledTask>,
    bindings: Vec<Binding>,
    defaults: Vec<DefaultSlot>,
    requests: Vec<Request>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a task factory to a trigger.  Bindings fire in registration
    /// order.
    pub fn bind(&mut self, trigger: Trigger, kind: BindingKind, factory: TaskFactory) {
        debug!(trigger = trigger.label(), ?kind, "binding registered");
        self.bindings.push(Binding {
            trigger,
            kind,
            factory,
            edges: EdgeDetector::default(),
            instance: None,
        });
    }

    /// Register the task that runs whenever its resources are unowned.
    /// Default tasks are admitted at [`Priority::Idle`], so any triggered
    /// task pre-empts them.
    ///
    /// # Errors
    ///
    /// [`GiganError::Config`] if the task requires nothing, or if one of its
    /// resources already has a default.
    pub fn set_default_task(&mut self, mut factory: TaskFactory) -> Result<(), GiganError> {
        let spare = factory();
        let requirements = spare.requirements().to_vec();
        if requirements.is_empty() {
            return Err(GiganError::Config(format!(
                "default task '{}' requires no resources",
                spare.name()
            )));
        }
        if let Some(tag) = requirements
            .iter()
            .find(|tag| self.defaults.iter().any(|d| d.requirements.contains(tag)))
        {
            return Err(GiganError::Config(format!(
                "resource '{tag}' already has a default task"
            )));
        }
        debug!(task = spare.name(), resources = ?requirements, "default task registered");
        self.defaults.push(DefaultSlot {
            requirements,
            factory,
            spare: Some(spare),
            instance: None,
        });
        Ok(())
    }

    /// Queue `task` for admission on the next tick, ahead of any
    /// trigger-driven admissions.
    pub fn schedule(&mut self, task: Box<dyn Task>) -> TaskId {
        let entry = ScheduledTask::new(task, None);
        let id = entry.id;
        debug!(task = %entry.name, %id, "schedule requested");
        self.requests.push(Request::Schedule(entry));
        id
    }

    /// Request cancellation of `id`.  Takes effect at the start of the next
    /// tick.  Unknown or already retired ids are ignored.
    pub fn cancel(&mut self, id: TaskId) {
        self.requests.push(Request::Cancel(id));
    }

    /// Request cancellation of every running and pending task.
    pub fn cancel_all(&mut self) {
        self.requests.push(Request::CancelAll);
    }

    /// Advance the scheduler by one tick.
    ///
    /// While `enabled` is false every running task is interrupted, schedule
    /// requests are dropped and nothing executes; trigger edges are still
    /// tracked so a button held across enable does not fire spuriously.
    pub fn tick(
        &mut self,
        hardware: &mut MechanismRegistry,
        input: &InputSnapshot,
        now: Duration,
        enabled: bool,
    ) -> TickReport {
        let mut report = TickReport::default();
        let mut env = Env {
            hardware,
            input,
            now,
        };

        // 0. Deferred requests, in arrival order.
        let mut incoming: Vec<ScheduledTask> = Vec::new();
        for request in std::mem::take(&mut self.requests) {
            match request {
                Request::Schedule(entry) => incoming.push(entry),
                Request::Cancel(id) => {
                    incoming.retain(|entry| entry.id != id);
                    self.interrupt(id, &mut env, &mut report);
                }
                Request::CancelAll => {
                    incoming.clear();
                    self.interrupt_all(&mut env, &mut report);
                }
            }
        }

        // 1. Triggers.
        let mut fired = Vec::new();
        let mut released = Vec::new();
        for (index, binding) in self.bindings.iter_mut().enumerate() {
            let edge = binding.edges.update(binding.trigger.evaluate(input));
            match (binding.kind, edge) {
                (BindingKind::OnTrue | BindingKind::WhileTrue, Edge::Rising)
                | (BindingKind::OnFalse, Edge::Falling) => fired.push(index),
                (BindingKind::WhileTrue, Edge::Falling) => released.extend(binding.instance.take()),
                (BindingKind::ToggleOnTrue, Edge::Rising) => {
                    let live = binding
                        .instance
                        .filter(|id| self.running.iter().any(|entry| entry.id == *id));
                    match live {
                        Some(id) => {
                            binding.instance = None;
                            self.requests.push(Request::Cancel(id));
                        }
                        None => fired.push(index),
                    }
                }
                _ => {}
            }
        }

        if !enabled {
            self.interrupt_all(&mut env, &mut report);
            for entry in incoming {
                debug!(task = %entry.name, "schedule request dropped while disabled");
                report.rejected.push(entry.name);
            }
            return report;
        }

        // 2. Admission: programmatic requests, then triggered bindings.
        for entry in incoming {
            self.admit(entry, &mut env, &mut report);
        }
        for index in fired {
            let task = (self.bindings[index].factory)();
            let entry = ScheduledTask::new(task, None);
            let id = entry.id;
            if self.admit(entry, &mut env, &mut report) {
                self.bindings[index].instance = Some(id);
            }
        }

        // 3. Defaults for unowned resources.
        for index in 0..self.defaults.len() {
            let slot = &self.defaults[index];
            if slot.instance.is_some_and(|id| self.is_running(id))
                || !slot.requirements.iter().all(|tag| self.arbiter.is_free(tag))
            {
                continue;
            }
            let slot = &mut self.defaults[index];
            let task = match slot.spare.take() {
                Some(task) => task,
                None => (slot.factory)(),
            };
            let entry = ScheduledTask::new(task, Some(Priority::Idle));
            let id = entry.id;
            if self.admit(entry, &mut env, &mut report) {
                self.defaults[index].instance = Some(id);
            }
        }

        // 4. Execute.
        let mut index = 0;
        while index < self.running.len() {
            let entry = &mut self.running[index];
            let result = {
                let mut ctx = TaskContext::new(
                    &entry.name,
                    &entry.requirements,
                    env.hardware,
                    env.input,
                    env.now,
                    entry.started_at,
                );
                entry.task.on_tick(&mut ctx)
            };
            match result {
                Ok(()) => index += 1,
                Err(e) => {
                    let entry = self.running.remove(index);
                    error!(
                        task = %entry.name,
                        id = %entry.id,
                        error = %e,
                        "task faulted in on_tick"
                    );
                    report.faulted.push(entry.name.clone());
                    self.retire(entry, true, &mut env);
                }
            }
        }

        // 5. Retire finished and released tasks.
        let mut index = 0;
        while index < self.running.len() {
            let entry = &self.running[index];
            let done = released.contains(&entry.id) || {
                let ctx = TaskContext::new(
                    &entry.name,
                    &entry.requirements,
                    env.hardware,
                    env.input,
                    env.now,
                    entry.started_at,
                );
                entry.task.is_finished(&ctx)
            };
            if done {
                let entry = self.running.remove(index);
                info!(task = %entry.name, id = %entry.id, "task finished");
                report.finished.push(entry.name.clone());
                self.end(entry, false, &mut env, &mut report);
            } else {
                index += 1;
            }
        }

        report
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn is_running(&self, id: TaskId) -> bool {
        self.running.iter().any(|entry| entry.id == id)
    }

    pub fn state_of(&self, id: TaskId) -> TaskState {
        if let Some(entry) = self.running.iter().find(|entry| entry.id == id) {
            return entry.state;
        }
        let pending = self
            .requests
            .iter()
            .any(|r| matches!(r, Request::Schedule(entry) if entry.id == id));
        if pending {
            TaskState::Pending
        } else {
            TaskState::Retired
        }
    }

    /// Running tasks in admission order.
    pub fn running(&self) -> Vec<TaskInfo> {
        self.running
            .iter()
            .map(|entry| TaskInfo {
                id: entry.id,
                name: entry.name.clone(),
                resources: entry.requirements.clone(),
                priority: entry.priority,
                started_at_secs: entry.started_at.as_secs_f64(),
            })
            .collect()
    }

    /// Name of the task currently holding `resource`.
    pub fn holder_of(&self, resource: &ResourceTag) -> Option<&str> {
        self.arbiter
            .holder(resource)
            .map(|claim| claim.task_name.as_str())
    }

    pub fn arbiter_snapshot(&self) -> ArbiterSnapshot {
        self.arbiter.snapshot()
    }

    // ── Internals ───────────────────────────────────────────────────────────

    /// Admit `entry`, interrupting whatever it pre-empts.  Returns `true` if
    /// the task is now running.
    fn admit(
        &mut self,
        mut entry: ScheduledTask,
        env: &mut Env<'_>,
        report: &mut TickReport,
    ) -> bool {
        match self.arbiter.try_admit(&entry.requirements, entry.priority) {
            Admission::Admitted => {}
            Admission::Conflict(holders) => {
                for holder in holders {
                    debug!(task = %entry.name, preempted = %holder, "pre-empting holder");
                    self.interrupt(holder, env, report);
                }
            }
            Admission::Rejected(holders) => {
                debug!(task = %entry.name, blocked_by = ?holders, "admission rejected");
                report.rejected.push(entry.name);
                return false;
            }
        }

        if let Err(e) = self
            .arbiter
            .claim(entry.id, &entry.name, &entry.requirements, entry.priority)
        {
            error!(task = %entry.name, error = %e, "claim failed after admission");
            report.rejected.push(entry.name);
            return false;
        }

        entry.started_at = env.now;
        entry.state = TaskState::Running;
        let result = {
            let mut ctx = TaskContext::new(
                &entry.name,
                &entry.requirements,
                env.hardware,
                env.input,
                env.now,
                entry.started_at,
            );
            entry.task.on_start(&mut ctx)
        };
        match result {
            Ok(()) => {
                info!(
                    task = %entry.name,
                    id = %entry.id,
                    resources = ?entry.requirements,
                    "task started"
                );
                report.started.push(entry.name.clone());
                self.running.push(entry);
                true
            }
            Err(e) => {
                error!(task = %entry.name, id = %entry.id, error = %e, "task faulted in on_start");
                report.faulted.push(entry.name.clone());
                self.retire(entry, true, env);
                false
            }
        }
    }

    fn interrupt(&mut self, id: TaskId, env: &mut Env<'_>, report: &mut TickReport) {
        let Some(position) = self.running.iter().position(|entry| entry.id == id) else {
            debug!(%id, "interrupt ignored: task not running");
            return;
        };
        let entry = self.running.remove(position);
        info!(task = %entry.name, id = %entry.id, "task interrupted");
        report.interrupted.push(entry.name.clone());
        self.end(entry, true, env, report);
    }

    fn interrupt_all(&mut self, env: &mut Env<'_>, report: &mut TickReport) {
        for entry in std::mem::take(&mut self.running) {
            info!(task = %entry.name, id = %entry.id, "task interrupted");
            report.interrupted.push(entry.name.clone());
            self.end(entry, true, env, report);
        }
    }

    /// [`retire`](Self::retire) a task that had not faulted yet; a failing
    /// `on_end` is reported as a fault.
    fn end(
        &mut self,
        entry: ScheduledTask,
        interrupted: bool,
        env: &mut Env<'_>,
        report: &mut TickReport,
    ) {
        let name = entry.name.clone();
        if !self.retire(entry, interrupted, env) {
            report.faulted.push(name);
        }
    }

    /// Run `on_end` and release the task's resources.  Returns `false` if
    /// `on_end` failed; the resources are released either way.
    fn retire(&mut self, mut entry: ScheduledTask, interrupted: bool, env: &mut Env<'_>) -> bool {
        entry.state = TaskState::Ending;
        let result = {
            let mut ctx = TaskContext::new(
                &entry.name,
                &entry.requirements,
                env.hardware,
                env.input,
                env.now,
                entry.started_at,
            );
            entry.task.on_end(&mut ctx, interrupted)
        };
        if let Err(e) = &result {
            warn!(task = %entry.name, id = %entry.id, error = %e, "on_end failed");
        }
        let freed = self.arbiter.release(entry.id);
        entry.state = TaskState::Retired;
        debug!(task = %entry.name, ?freed, interrupted, state = ?entry.state, "task retired");
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{FnTask, apply_once, factory, hold};
    use gigan_hal::MotorMechanism;
    use gigan_hal::sim::SimMotor;
    use gigan_types::Action;

    fn hardware() -> MechanismRegistry {
        let mut registry = MechanismRegistry::new();
        registry
            .register(Box::new(
                MotorMechanism::new("shooter")
                    .with_group("conveyor", 0.38, vec![SimMotor::new("conveyor_left")])
                    .with_group("flywheel", 1.0, vec![SimMotor::new("flywheel")]),
            ))
            .unwrap();
        registry
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn tag(name: &str) -> ResourceTag {
        ResourceTag::new(name)
    }

    #[test]
    fn scheduled_task_starts_next_tick() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(hold("feed", "conveyor", Action::Forward).boxed());
        assert_eq!(scheduler.state_of(id), TaskState::Pending);

        let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);
        assert_eq!(report.started, vec!["feed"]);
        assert_eq!(scheduler.state_of(id), TaskState::Running);
        assert_eq!(scheduler.holder_of(&tag("conveyor")), Some("feed"));
        assert_eq!(hw.last_action(&tag("conveyor")), Some(&Action::Forward));
    }

    #[test]
    fn finished_task_releases_for_next_tick() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(apply_once("kick", "flywheel", Action::Speed(0.5)).boxed());

        let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);
        assert_eq!(report.started, vec!["kick"]);
        assert_eq!(report.finished, vec!["kick"]);
        assert_eq!(scheduler.state_of(id), TaskState::Retired);
        assert!(scheduler.arbiter_snapshot().holders.is_empty());
    }

    #[test]
    fn cancel_is_applied_at_next_tick() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(hold("feed", "conveyor", Action::Forward).boxed());
        scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);

        scheduler.cancel(id);
        assert!(scheduler.is_running(id));
        let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), true);
        assert_eq!(report.interrupted, vec!["feed"]);
        assert!(!scheduler.is_running(id));
        assert_eq!(scheduler.holder_of(&tag("conveyor")), None);
    }

    #[test]
    fn cancel_of_pending_request_prevents_start() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(hold("feed", "conveyor", Action::Forward).boxed());
        scheduler.cancel(id);
        let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);
        assert!(report.is_quiet());
        assert_eq!(hw.last_action(&tag("conveyor")), None);
    }

    #[test]
    fn default_task_yields_and_resumes() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        scheduler
            .set_default_task(factory(|| hold("conveyor_stop", "conveyor", Action::Stop).boxed()))
            .unwrap();
        scheduler.bind(
            Trigger::button("feed"),
            BindingKind::WhileTrue,
            factory(|| hold("feed", "conveyor", Action::Forward).boxed()),
        );

        let idle = InputSnapshot::new();
        let pressed = InputSnapshot::new().with_button("feed", true);

        let r = scheduler.tick(&mut hw, &idle, ms(0), true);
        assert_eq!(r.started, vec!["conveyor_stop"]);

        let r = scheduler.tick(&mut hw, &pressed, ms(20), true);
        assert_eq!(r.interrupted, vec!["conveyor_stop"]);
        assert_eq!(r.started, vec!["feed"]);
        assert_eq!(hw.last_action(&tag("conveyor")), Some(&Action::Forward));

        // Release: the held task ends this tick, the default returns next tick.
        let r = scheduler.tick(&mut hw, &idle, ms(40), true);
        assert_eq!(r.finished, vec!["feed"]);
        assert!(r.started.is_empty());
        assert_eq!(scheduler.holder_of(&tag("conveyor")), None);

        let r = scheduler.tick(&mut hw, &idle, ms(60), true);
        assert_eq!(r.started, vec!["conveyor_stop"]);
        assert_eq!(hw.last_action(&tag("conveyor")), Some(&Action::Stop));
    }

    #[test]
    fn default_registration_is_validated() {
        let mut scheduler = Scheduler::new();
        assert!(matches!(
            scheduler.set_default_task(factory(|| FnTask::new("nothing").boxed())),
            Err(GiganError::Config(_))
        ));
        scheduler
            .set_default_task(factory(|| hold("a", "conveyor", Action::Stop).boxed()))
            .unwrap();
        assert!(matches!(
            scheduler.set_default_task(factory(|| hold("b", "conveyor", Action::Stop).boxed())),
            Err(GiganError::Config(_))
        ));
    }

    #[test]
    fn critical_holder_rejects_normal_task() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(
            hold("climb_lock", "flywheel", Action::Stop)
                .with_priority(Priority::Critical)
                .boxed(),
        );
        scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);

        scheduler.schedule(hold("spin", "flywheel", Action::Forward).boxed());
        let r = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), true);
        assert_eq!(r.rejected, vec!["spin"]);
        assert_eq!(scheduler.holder_of(&tag("flywheel")), Some("climb_lock"));
    }

    #[test]
    fn toggle_starts_then_cancels() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        scheduler.bind(
            Trigger::button("spin"),
            BindingKind::ToggleOnTrue,
            factory(|| hold("spin", "flywheel", Action::Forward).boxed()),
        );
        let idle = InputSnapshot::new();
        let pressed = InputSnapshot::new().with_button("spin", true);

        assert_eq!(scheduler.tick(&mut hw, &pressed, ms(0), true).started, vec!["spin"]);
        scheduler.tick(&mut hw, &idle, ms(20), true);
        // Second press queues the cancel; it lands on the following tick.
        assert!(scheduler.tick(&mut hw, &pressed, ms(40), true).interrupted.is_empty());
        let r = scheduler.tick(&mut hw, &pressed, ms(60), true);
        assert_eq!(r.interrupted, vec!["spin"]);
        assert!(scheduler.running().is_empty());
    }

    #[test]
    fn on_false_fires_on_release() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        scheduler.bind(
            Trigger::button("b"),
            BindingKind::OnFalse,
            factory(|| hold("after", "conveyor", Action::Reverse).boxed()),
        );
        let pressed = InputSnapshot::new().with_button("b", true);
        assert!(scheduler.tick(&mut hw, &pressed, ms(0), true).started.is_empty());
        let r = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), true);
        assert_eq!(r.started, vec!["after"]);
    }

    #[test]
    fn disabled_tick_interrupts_and_drops_requests() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(hold("feed", "conveyor", Action::Forward).boxed());
        scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);

        scheduler.schedule(hold("spin", "flywheel", Action::Forward).boxed());
        let r = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), false);
        assert_eq!(r.interrupted, vec!["feed"]);
        assert_eq!(r.rejected, vec!["spin"]);
        assert!(scheduler.running().is_empty());
        assert_eq!(hw.last_action(&tag("flywheel")), None);
    }

    #[test]
    fn running_reports_admission_order() {
        let mut hw = hardware();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(hold("feed", "conveyor", Action::Forward).boxed());
        scheduler.schedule(hold("spin", "flywheel", Action::Forward).boxed());
        scheduler.tick(&mut hw, &InputSnapshot::new(), ms(100), true);

        let running = scheduler.running();
        let names: Vec<&str> = running.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["feed", "spin"]);
        assert!((running[0].started_at_secs - 0.1).abs() < 1e-9);
    }
}
