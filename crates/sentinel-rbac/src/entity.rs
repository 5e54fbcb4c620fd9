//! # Entities and Actions
//!
//! An entity is a subject type (e.g. `user`, `invoice`) that declares the
//! actions callers may attempt on it. Each action carries the permissions
//! required to perform it. Actions are namespaced per entity: two entities
//! can both declare `read` with different requirements.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};
use crate::permissions::PermissionSet;

/// Name of an action declared on an [`Entity`].
///
/// An action is only meaningful together with its owning entity; the same
/// name on another entity is a different action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Create an action handle from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the action name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the name is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A subject type and its action table.
///
/// # Example
///
/// ```
/// use sentinel_rbac::{Entity, PermissionSet};
///
/// let mut user = Entity::new("user");
/// let read = user.new_action("read", PermissionSet::READ).unwrap();
///
/// assert!(user.has_action(&read));
/// assert!(user.new_action("read", PermissionSet::SELF_READ).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    actions: HashMap<Action, PermissionSet>,
}

impl Entity {
    /// Create an entity with an empty action table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
        }
    }

    /// Get the entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an action with its required permissions.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateAction`] if the entity already has an action
    /// with this name. The existing requirement is left untouched.
    pub fn new_action(
        &mut self,
        name: impl Into<String>,
        required: PermissionSet,
    ) -> ConfigResult<Action> {
        let action = Action::new(name);

        if self.has_action(&action) {
            return Err(ConfigError::DuplicateAction {
                entity: self.name.clone(),
                action: action.0,
            });
        }

        self.actions.insert(action.clone(), required);

        Ok(action)
    }

    /// Remove an action. Removing an unknown action is a no-op.
    pub fn remove_action(&mut self, action: &Action) {
        self.actions.remove(action);
    }

    /// Check if the entity declares this action.
    pub fn has_action(&self, action: &Action) -> bool {
        self.actions.contains_key(action)
    }

    /// Permissions required to perform an action, if declared.
    pub fn required_permissions(&self, action: &Action) -> Option<PermissionSet> {
        self.actions.get(action).copied()
    }

    /// Iterate over declared actions and their requirements.
    pub fn actions(&self) -> impl Iterator<Item = (&Action, PermissionSet)> {
        self.actions.iter().map(|(action, perms)| (action, *perms))
    }
}
