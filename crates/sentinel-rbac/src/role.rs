//! Roles
//!
//! A role binds a name to a [`PermissionSet`]. Roles are plain values: they
//! are built once while normalizing configuration and then cloned into
//! every scope that resolves them.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{AuthzError, AuthzResult};
use crate::permissions::PermissionSet;

/// A named grant of permissions.
///
/// # Examples
///
/// ```
/// use sentinel_rbac::{PermissionSet, Role};
///
/// let admin = Role::new("admin", PermissionSet::CREATE | PermissionSet::READ);
/// assert_eq!(admin.name, "admin");
/// assert!(admin.permissions.contains(PermissionSet::READ));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Role {
    /// Unique name within the declaring scope.
    pub name: String,

    /// Permissions granted by this role.
    pub permissions: PermissionSet,
}

impl Role {
    /// Create a new role.
    pub fn new(name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            name: name.into(),
            permissions,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Get the names of the given roles, in order.
pub fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|role| role.name.clone()).collect()
}

/// Union of the permissions of all given roles.
pub fn merged_permissions(roles: &[Role]) -> PermissionSet {
    roles
        .iter()
        .fold(PermissionSet::empty(), |acc, role| acc | role.permissions)
}

/// Find a role by name.
pub fn find_role<'a>(roles: &'a [Role], name: &str) -> Option<&'a Role> {
    roles.iter().find(|role| role.name == name)
}

/// Resolve role names against a role list.
///
/// Fails on the first name that isn't found; `scope` names the role list in
/// the error.
pub fn roles_by_names<S: AsRef<str>>(
    roles: &[Role],
    names: &[S],
    scope: &str,
) -> AuthzResult<Vec<Role>> {
    let index: HashMap<&str, &Role> = roles.iter().map(|r| (r.name.as_str(), r)).collect();

    names
        .iter()
        .map(|name| {
            index
                .get(name.as_ref())
                .map(|role| (*role).clone())
                .ok_or_else(|| AuthzError::RoleNotFound {
                    scope: scope.to_string(),
                    role: name.as_ref().to_string(),
                })
        })
        .collect()
}

/// Compute the effective roles of a schema from the host's global roles.
///
/// - A role the schema declares under a global name replaces the global one
///   in place (schema permissions win).
/// - Global roles the schema doesn't mention are carried over unchanged.
/// - Schema-only roles follow, in declaration order.
/// - A schema that declares no roles gets the global list verbatim.
///
/// Neither input is modified; the result is an independent copy. Applying
/// the merge to its own output gives the same output.
///
/// # Arguments
///
/// * `global` - Roles shared by every schema of the host
/// * `own` - Roles declared by the schema itself
///
/// # Returns
///
/// The schema's effective role list.
///
/// # Example
///
/// ```
/// use sentinel_rbac::{merge_roles, PermissionSet, Role};
///
/// let global = vec![Role::new("user", PermissionSet::SELF_READ)];
/// let own = vec![Role::new("user", PermissionSet::READ)];
///
/// let merged = merge_roles(&global, &own);
/// assert_eq!(merged, vec![Role::new("user", PermissionSet::READ)]);
/// ```
pub fn merge_roles(global: &[Role], own: &[Role]) -> Vec<Role> {
    if own.is_empty() {
        return global.to_vec();
    }

    let global_names: HashSet<&str> = global.iter().map(|r| r.name.as_str()).collect();

    let mut merged: Vec<Role> = global
        .iter()
        .map(|global_role| {
            find_role(own, &global_role.name)
                .unwrap_or(global_role)
                .clone()
        })
        .collect();

    merged.extend(
        own.iter()
            .filter(|role| !global_names.contains(role.name.as_str()))
            .cloned(),
    );

    merged
}
