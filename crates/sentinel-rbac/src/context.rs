//! Authorization context
//!
//! The triple identifying what is being attempted: an action on an entity,
//! against a resource.

use crate::entity::{Action, Entity};
use crate::policy::RuleKey;
use crate::resource::Resource;

/// What is being attempted.
///
/// Borrowed from the schema that owns the entity and resource, so a context
/// never outlives the configuration it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext<'a> {
    /// Entity the action is declared on.
    pub entity: &'a Entity,
    /// Action being attempted.
    pub action: Action,
    /// Resource the action targets.
    pub resource: &'a Resource,
}

impl<'a> AuthorizationContext<'a> {
    /// Create a new context.
    pub fn new(entity: &'a Entity, action: Action, resource: &'a Resource) -> Self {
        Self {
            entity,
            action,
            resource,
        }
    }

    /// The action-gate lookup key for this context.
    pub fn key(&self) -> RuleKey {
        RuleKey::new(self.entity.name(), self.action.clone(), self.resource.name())
    }
}

impl std::fmt::Display for AuthorizationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.entity.name(),
            self.action,
            self.resource.name()
        )
    }
}
