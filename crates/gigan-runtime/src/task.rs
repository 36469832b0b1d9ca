//! [`Task`] – the unit of cooperative work the scheduler drives.
//!
//! A task declares the resources it needs up front and then receives
//! lifecycle callbacks from the [`Scheduler`][crate::scheduler::Scheduler]:
//!
//! ```text
//! Pending ──admit──▶ Running ──finish / interrupt / fault──▶ Ending ──▶ Retired
//!            on_start        on_tick × N                  on_end
//! ```
//!
//! Callbacks run on the scheduler's thread and must return quickly; a task
//! that needs to wait does so across ticks by checking
//! [`TaskContext::elapsed`].
//!
//! # Example
//!
//! ```rust
//! use gigan_runtime::task::{FnTask, Task};
//! use gigan_types::{Action, ResourceTag};
//!
//! let conveyor = ResourceTag::new("conveyor");
//! let task = FnTask::new("feed")
//!     .requires(conveyor.clone())
//!     .on_tick(move |ctx| ctx.apply(&conveyor, Action::Forward))
//!     .until(|ctx| ctx.elapsed().as_secs_f64() >= 1.0);
//!
//! assert_eq!(task.name(), "feed");
//! assert_eq!(task.requirements(), &[ResourceTag::new("conveyor")]);
//! ```

use std::time::Duration;

use gigan_hal::MechanismRegistry;
use gigan_types::{Action, GiganError, InputSnapshot, Priority, ResourceTag};

// ─────────────────────────────────────────────────────────────────────────────
// Task trait
// ─────────────────────────────────────────────────────────────────────────────

/// A cooperative, resource-declaring unit of work.
///
/// Every callback may fail.  A failing `on_start` or `on_tick` force-retires
/// the task (its `on_end` runs with `interrupted == true`); a failing `on_end`
/// is logged and otherwise ignored.  Faults never reach other tasks.
pub trait Task: Send {
    fn name(&self) -> &str;

    /// Resources this task must hold exclusively while it runs.  Read once,
    /// at admission.
    fn requirements(&self) -> &[ResourceTag];

    fn priority(&self) -> Priority {
        Priority::Normal
    }

    /// Called once, after every required resource has been claimed.
    fn on_start(&mut self, _ctx: &mut TaskContext<'_>) -> Result<(), GiganError> {
        Ok(())
    }

    /// Called once per tick while the task is running.
    fn on_tick(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), GiganError>;

    /// Called exactly once when the task leaves the running set.
    /// `interrupted` is `true` when the task was pre-empted, cancelled or
    /// faulted, `false` when it finished on its own.
    fn on_end(&mut self, _ctx: &mut TaskContext<'_>, _interrupted: bool) -> Result<(), GiganError> {
        Ok(())
    }

    /// Polled after each `on_tick`.
    fn is_finished(&self, _ctx: &TaskContext<'_>) -> bool {
        false
    }
}

/// Builds a fresh task instance each time a binding or default fires.
pub type TaskFactory = Box<dyn FnMut() -> Box<dyn Task> + Send>;

/// Wrap a closure as a [`TaskFactory`].
pub fn factory<F>(f: F) -> TaskFactory
where
    F: FnMut() -> Box<dyn Task> + Send + 'static,
{
    Box::new(f)
}

/// Lifecycle position of a task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Ending,
    Retired,
}

// ─────────────────────────────────────────────────────────────────────────────
// TaskContext
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a task may touch during one callback.
///
/// Writes are checked against the resources the task holds; a task can never
/// drive a mechanism it has not claimed.
pub struct TaskContext<'a> {
    task: &'a str,
    held: &'a [ResourceTag],
    hardware: &'a mut MechanismRegistry,
    input: &'a InputSnapshot,
    now: Duration,
    started_at: Duration,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(
        task: &'a str,
        held: &'a [ResourceTag],
        hardware: &'a mut MechanismRegistry,
        input: &'a InputSnapshot,
        now: Duration,
        started_at: Duration,
    ) -> Self {
        Self {
            task,
            held,
            hardware,
            input,
            now,
            started_at,
        }
    }

    /// Apply `action` to `resource`.
    ///
    /// # Errors
    ///
    /// [`GiganError::ResourceNotHeld`] if this task does not hold `resource`,
    /// otherwise whatever the mechanism returns.
    pub fn apply(&mut self, resource: &ResourceTag, action: Action) -> Result<(), GiganError> {
        if !self.held.contains(resource) {
            return Err(GiganError::ResourceNotHeld {
                task: self.task.to_string(),
                resource: resource.clone(),
            });
        }
        self.hardware.apply(resource, &action)
    }

    /// The operator input captured at the start of this tick.
    pub fn input(&self) -> &InputSnapshot {
        self.input
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Time since this task was started.
    pub fn elapsed(&self) -> Duration {
        self.now.saturating_sub(self.started_at)
    }

    pub fn held(&self) -> &[ResourceTag] {
        self.held
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FnTask
// ─────────────────────────────────────────────────────────────────────────────

type Hook = Box<dyn FnMut(&mut TaskContext<'_>) -> Result<(), GiganError> + Send>;
type EndHook = Box<dyn FnMut(&mut TaskContext<'_>, bool) -> Result<(), GiganError> + Send>;
type FinishHook = Box<dyn Fn(&TaskContext<'_>) -> bool + Send>;

/// A task assembled from closures.  Any hook left unset is a no-op; without
/// [`FnTask::until`] the task runs until interrupted.
pub struct FnTask {
    name: String,
    requirements: Vec<ResourceTag>,
    priority: Priority,
    start: Option<Hook>,
    tick: Option<Hook>,
    end: Option<EndHook>,
    finished: Option<FinishHook>,
}

impl FnTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
            priority: Priority::Normal,
            start: None,
            tick: None,
            end: None,
            finished: None,
        }
    }

    /// Add a required resource.  Duplicates are ignored.
    pub fn requires(mut self, resource: impl Into<ResourceTag>) -> Self {
        let resource = resource.into();
        if !self.requirements.contains(&resource) {
            self.requirements.push(resource);
        }
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut TaskContext<'_>) -> Result<(), GiganError> + Send + 'static,
    {
        self.start = Some(Box::new(f));
        self
    }

    pub fn on_tick<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut TaskContext<'_>) -> Result<(), GiganError> + Send + 'static,
    {
        self.tick = Some(Box::new(f));
        self
    }

    pub fn on_end<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut TaskContext<'_>, bool) -> Result<(), GiganError> + Send + 'static,
    {
        self.end = Some(Box::new(f));
        self
    }

    pub fn until<F>(mut self, f: F) -> Self
    where
        F: Fn(&TaskContext<'_>) -> bool + Send + 'static,
    {
        self.finished = Some(Box::new(f));
        self
    }

    pub fn boxed(self) -> Box<dyn Task> {
        Box::new(self)
    }
}

impl Task for FnTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ResourceTag] {
        &self.requirements
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn on_start(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), GiganError> {
        match self.start.as_mut() {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn on_tick(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), GiganError> {
        match self.tick.as_mut() {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn on_end(&mut self, ctx: &mut TaskContext<'_>, interrupted: bool) -> Result<(), GiganError> {
        match self.end.as_mut() {
            Some(f) => f(ctx, interrupted),
            None => Ok(()),
        }
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        self.finished.as_ref().is_some_and(|f| f(ctx))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Common shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Apply `action` to `resource` on every tick until interrupted.
pub fn hold(name: impl Into<String>, resource: impl Into<ResourceTag>, action: Action) -> FnTask {
    let resource = resource.into();
    let tag = resource.clone();
    FnTask::new(name)
        .requires(resource)
        .on_tick(move |ctx| ctx.apply(&tag, action.clone()))
}

/// Apply `action` to each resource on every tick until interrupted.
pub fn hold_all(name: impl Into<String>, writes: Vec<(ResourceTag, Action)>) -> FnTask {
    let mut task = FnTask::new(name);
    for (resource, _) in &writes {
        task = task.requires(resource.clone());
    }
    task.on_tick(move |ctx| {
        for (resource, action) in &writes {
            ctx.apply(resource, action.clone())?;
        }
        Ok(())
    })
}

/// Apply `action` to `resource` once, then finish.
pub fn apply_once(
    name: impl Into<String>,
    resource: impl Into<ResourceTag>,
    action: Action,
) -> FnTask {
    hold(name, resource, action).until(|_| true)
}

/// A task that requires nothing and never finishes.
pub fn idle(name: impl Into<String>) -> FnTask {
    FnTask::new(name)
}
