//! [`MechanismRegistry`] – resource-tag router for every mechanism on the
//! robot.
//!
//! The scheduler only ever issues `apply(resource_tag, action)`; the registry
//! resolves the mechanism owning the tag and forwards the call.  Each tag is
//! owned by exactly one mechanism, enforced at registration time.

use std::collections::BTreeMap;

use gigan_types::{Action, GiganError, ResourceTag};
use tracing::{debug, warn};

use crate::mechanism::Mechanism;

/// Owns all mechanisms and routes actions to them by resource tag.
#[derive(Default)]
pub struct MechanismRegistry {
    mechanisms: Vec<Box<dyn Mechanism>>,
    routes: BTreeMap<ResourceTag, usize>,
}

impl MechanismRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`GiganError::Config`] if any of its resource tags is already
    /// owned by another mechanism; the registry is left unchanged.
    pub fn register(&mut self, mechanism: Box<dyn Mechanism>) -> Result<(), GiganError> {
        if let Some(tag) = mechanism
            .resources()
            .iter()
            .find(|tag| self.routes.contains_key(*tag))
        {
            return Err(GiganError::Config(format!(
                "resource '{tag}' claimed by both '{}' and '{}'",
                self.mechanisms[self.routes[tag]].name(),
                mechanism.name()
            )));
        }
        let idx = self.mechanisms.len();
        for tag in mechanism.resources() {
            self.routes.insert(tag.clone(), idx);
        }
        debug!(mechanism = mechanism.name(), "registered mechanism");
        self.mechanisms.push(mechanism);
        Ok(())
    }

    /// Forward `action` to the mechanism owning `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`GiganError::UnknownResource`] when no mechanism owns the tag,
    /// or whatever the mechanism itself reports.
    pub fn apply(&mut self, resource: &ResourceTag, action: &Action) -> Result<(), GiganError> {
        let idx = *self
            .routes
            .get(resource)
            .ok_or_else(|| GiganError::UnknownResource(resource.clone()))?;
        self.mechanisms[idx].apply(resource, action)
    }

    /// The last action applied to `resource`, if any.
    pub fn last_action(&self, resource: &ResourceTag) -> Option<&Action> {
        let idx = *self.routes.get(resource)?;
        self.mechanisms[idx].last_action(resource)
    }

    pub fn contains(&self, resource: &ResourceTag) -> bool {
        self.routes.contains_key(resource)
    }

    /// All registered resource tags in sorted order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceTag> {
        self.routes.keys()
    }

    /// Put every resource into its mechanism's safe state.
    ///
    /// Every resource is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered.
    pub fn apply_safe_state(&mut self) -> Result<(), GiganError> {
        let mut first_err = None;
        for (tag, &idx) in &self.routes {
            let mechanism = &mut self.mechanisms[idx];
            let action = mechanism.safe_action(tag);
            if let Err(e) = mechanism.apply(tag, &action) {
                warn!(resource = %tag, error = %e, "failed to apply safe state");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
