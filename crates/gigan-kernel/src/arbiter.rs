//! [`ResourceArbiter`] – exclusive ownership of mechanism resources.
//!
//! Before a task may run, the scheduler asks [`ResourceArbiter::try_admit`]
//! whether every resource the task requires is available.  The arbiter never
//! interrupts anything itself; it reports which holders stand in the way and
//! leaves the interruption to the scheduler, which then calls
//! [`ResourceArbiter::release`] for the losers and
//! [`ResourceArbiter::claim`] for the winner.

use std::collections::BTreeMap;

use gigan_types::{GiganError, Priority, ResourceTag, TaskId};
use serde::Serialize;

/// One held resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub task: TaskId,
    pub task_name: String,
    pub priority: Priority,
}

/// Outcome of an admission query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Every required resource is free.
    Admitted,
    /// Some resources are held by tasks that must be interrupted first.
    /// Listed once each, in the order their resources were required.
    Conflict(Vec<TaskId>),
    /// A holder outranks the incoming task; it must not be admitted.
    Rejected(Vec<TaskId>),
}

/// Read-only view of the resource map for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ArbiterSnapshot {
    /// Resource tag → name of the holding task.
    pub holders: BTreeMap<ResourceTag, String>,
}

/// Tracks which task holds each resource.
///
/// # Example
///
/// ```
/// use gigan_kernel::arbiter::{Admission, ResourceArbiter};
/// use gigan_types::{Priority, ResourceTag, TaskId};
///
/// let mut arbiter = ResourceArbiter::new();
/// let dump = [ResourceTag::new("dump")];
///
/// let first = TaskId::new();
/// assert_eq!(arbiter.try_admit(&dump, Priority::Normal), Admission::Admitted);
/// arbiter.claim(first, "dump_extend", &dump, Priority::Normal).unwrap();
///
/// // A second normal-priority task pre-empts the first.
/// assert_eq!(
///     arbiter.try_admit(&dump, Priority::Normal),
///     Admission::Conflict(vec![first])
/// );
/// // A default task does not.
/// assert!(matches!(
///     arbiter.try_admit(&dump, Priority::Idle),
///     Admission::Rejected(_)
/// ));
/// ```
#[derive(Debug, Default)]
pub struct ResourceArbiter {
    claims: BTreeMap<ResourceTag, Claim>,
}

impl ResourceArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a task of `priority` requiring `requirements` can run.
    ///
    /// A holder yields to an incoming task of equal or higher priority
    /// (last-writer-wins) and blocks one of strictly lower priority.
    pub fn try_admit(&self, requirements: &[ResourceTag], priority: Priority) -> Admission {
        let mut yielding = Vec::new();
        let mut blocking = Vec::new();
        for tag in requirements {
            let Some(claim) = self.claims.get(tag) else {
                continue;
            };
            let bucket = if claim.priority > priority {
                &mut blocking
            } else {
                &mut yielding
            };
            if !bucket.contains(&claim.task) {
                bucket.push(claim.task);
            }
        }
        if !blocking.is_empty() {
            Admission::Rejected(blocking)
        } else if !yielding.is_empty() {
            Admission::Conflict(yielding)
        } else {
            Admission::Admitted
        }
    }

    /// Record `task` as the holder of every resource in `requirements`.
    ///
    /// # Errors
    ///
    /// Returns [`GiganError::ResourceBusy`] if another task still holds one of
    /// them; nothing is claimed in that case.
    pub fn claim(
        &mut self,
        task: TaskId,
        task_name: &str,
        requirements: &[ResourceTag],
        priority: Priority,
    ) -> Result<(), GiganError> {
        if let Some((tag, claim)) = requirements
            .iter()
            .filter_map(|tag| self.claims.get(tag).map(|c| (tag, c)))
            .find(|(_, c)| c.task != task)
        {
            return Err(GiganError::ResourceBusy {
                resource: tag.clone(),
                holder: claim.task_name.clone(),
            });
        }
        for tag in requirements {
            self.claims.insert(
                tag.clone(),
                Claim {
                    task,
                    task_name: task_name.to_string(),
                    priority,
                },
            );
        }
        Ok(())
    }

    /// Release everything held by `task`, returning the freed tags.
    /// No-ops for tasks that hold nothing.
    pub fn release(&mut self, task: TaskId) -> Vec<ResourceTag> {
        let freed: Vec<ResourceTag> = self
            .claims
            .iter()
            .filter(|(_, c)| c.task == task)
            .map(|(tag, _)| tag.clone())
            .collect();
        for tag in &freed {
            self.claims.remove(tag);
        }
        freed
    }

    pub fn holder(&self, tag: &ResourceTag) -> Option<&Claim> {
        self.claims.get(tag)
    }

    pub fn is_free(&self, tag: &ResourceTag) -> bool {
        !self.claims.contains_key(tag)
    }

    /// `true` when `task` holds `tag`.
    pub fn holds(&self, task: TaskId, tag: &ResourceTag) -> bool {
        self.claims.get(tag).is_some_and(|c| c.task == task)
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn snapshot(&self) -> ArbiterSnapshot {
        ArbiterSnapshot {
            holders: self
                .claims
                .iter()
                .map(|(tag, c)| (tag.clone(), c.task_name.clone()))
                .collect(),
        }
    }
}
