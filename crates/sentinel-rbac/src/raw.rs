//! Configuration document types
//!
//! The user-authored shape of an RBAC configuration, as decoded by serde.
//! Names in these types are unresolved; [`crate::normalize`] turns them into
//! the validated model. Unknown keys are rejected so that a misspelt field
//! can't silently widen a rule.

use serde::{Deserialize, Serialize};

use crate::permissions::{Permission, PermissionSet};

/// Permission flags as written in configuration. Missing keys are `false`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawPermissions {
    pub create: bool,
    pub self_create: bool,
    pub read: bool,
    pub self_read: bool,
    pub update: bool,
    pub self_update: bool,
    pub delete: bool,
    pub self_delete: bool,
}

impl RawPermissions {
    /// Convert the flags into a permission set.
    pub fn to_permission_set(&self) -> PermissionSet {
        [
            (self.create, Permission::Create),
            (self.self_create, Permission::SelfCreate),
            (self.read, Permission::Read),
            (self.self_read, Permission::SelfRead),
            (self.update, Permission::Update),
            (self.self_update, Permission::SelfUpdate),
            (self.delete, Permission::Delete),
            (self.self_delete, Permission::SelfDelete),
        ]
        .into_iter()
        .filter(|(granted, _)| *granted)
        .map(|(_, permission)| permission)
        .collect()
    }
}

impl From<PermissionSet> for RawPermissions {
    fn from(set: PermissionSet) -> Self {
        Self {
            create: set.has(Permission::Create),
            self_create: set.has(Permission::SelfCreate),
            read: set.has(Permission::Read),
            self_read: set.has(Permission::SelfRead),
            update: set.has(Permission::Update),
            self_update: set.has(Permission::SelfUpdate),
            delete: set.has(Permission::Delete),
            self_delete: set.has(Permission::SelfDelete),
        }
    }
}

/// A role declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RawRole {
    pub name: String,
    #[serde(default)]
    pub permissions: RawPermissions,
}

/// An action declaration inside an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RawAction {
    pub name: String,
    /// Permissions required to perform the action.
    #[serde(default)]
    pub permissions: RawPermissions,
}

/// An entity declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RawEntity {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<RawAction>,
}

/// An action-gate rule declaration.
///
/// ```json
/// { "for": ["user"], "having": ["admin"], "apply": "deny", "doing": ["read"], "on": "cache" }
/// ```
///
/// Expands to one rule per entity and action. An empty `having` means any
/// role of the schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RawRule {
    /// Entity names.
    #[serde(rename = "for")]
    pub entities: Vec<String>,
    /// Role names.
    #[serde(rename = "having", default)]
    pub roles: Vec<String>,
    /// Effect: `deny`, `require` or `allow`.
    #[serde(rename = "apply")]
    pub effect: String,
    /// Action names.
    #[serde(rename = "doing")]
    pub actions: Vec<String>,
    /// Resource name.
    #[serde(rename = "on")]
    pub resource: String,
}

/// A schema document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawSchema {
    pub id: String,
    pub name: String,
    pub roles: Vec<RawRole>,
    pub default_roles: Vec<String>,
    pub entities: Vec<RawEntity>,
    pub resources: Vec<String>,
    pub action_gate_policy: Vec<RawRule>,
}

/// A host document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawHost {
    pub default_roles: Vec<String>,
    pub roles: Vec<RawRole>,
    pub schemas: Vec<RawSchema>,
}
