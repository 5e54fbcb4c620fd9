//! # Permissions
//!
//! The fixed permission vocabulary and the flag set roles and actions carry.
//! Every authorization check in the crate reduces to [`satisfies`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// An atomic right drawn from the CRUD vocabulary.
///
/// Each right exists in two flavours:
/// - **Plain** (e.g. `Read`): applies to any instance of the entity
/// - **Self-scoped** (e.g. `SelfRead`): applies only to the caller's own instance
///
/// A self-scoped right never satisfies its plain counterpart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// Create new instances.
    Create,
    /// Create instances owned by the caller.
    SelfCreate,
    /// Read any instance.
    Read,
    /// Read the caller's own instance.
    SelfRead,
    /// Update any instance.
    Update,
    /// Update the caller's own instance.
    SelfUpdate,
    /// Delete any instance.
    Delete,
    /// Delete the caller's own instance.
    SelfDelete,
}

impl Permission {
    /// Get the configuration name of the permission.
    ///
    /// # Returns
    ///
    /// The kebab-case key used in configuration documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Create => "create",
            Permission::SelfCreate => "self-create",
            Permission::Read => "read",
            Permission::SelfRead => "self-read",
            Permission::Update => "update",
            Permission::SelfUpdate => "self-update",
            Permission::Delete => "delete",
            Permission::SelfDelete => "self-delete",
        }
    }

    /// Parse a permission from its configuration name.
    ///
    /// Case-insensitive; `_` is accepted in place of `-`.
    ///
    /// # Example
    ///
    /// ```
    /// use sentinel_rbac::permissions::Permission;
    ///
    /// assert_eq!(Permission::parse("read"), Some(Permission::Read));
    /// assert_eq!(Permission::parse("SELF_READ"), Some(Permission::SelfRead));
    /// assert_eq!(Permission::parse("write"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "create" => Some(Permission::Create),
            "self-create" => Some(Permission::SelfCreate),
            "read" => Some(Permission::Read),
            "self-read" => Some(Permission::SelfRead),
            "update" => Some(Permission::Update),
            "self-update" => Some(Permission::SelfUpdate),
            "delete" => Some(Permission::Delete),
            "self-delete" => Some(Permission::SelfDelete),
            _ => None,
        }
    }

    /// Get all permissions, in flag order.
    pub fn all() -> [Self; 8] {
        [
            Permission::Create,
            Permission::SelfCreate,
            Permission::Read,
            Permission::SelfRead,
            Permission::Update,
            Permission::SelfUpdate,
            Permission::Delete,
            Permission::SelfDelete,
        ]
    }

    /// Check if this right is restricted to the caller's own instance.
    pub fn is_self_scoped(&self) -> bool {
        matches!(
            self,
            Permission::SelfCreate
                | Permission::SelfRead
                | Permission::SelfUpdate
                | Permission::SelfDelete
        )
    }

    /// The single flag representing this permission.
    pub fn flag(self) -> PermissionSet {
        match self {
            Permission::Create => PermissionSet::CREATE,
            Permission::SelfCreate => PermissionSet::SELF_CREATE,
            Permission::Read => PermissionSet::READ,
            Permission::SelfRead => PermissionSet::SELF_READ,
            Permission::Update => PermissionSet::UPDATE,
            Permission::SelfUpdate => PermissionSet::SELF_UPDATE,
            Permission::Delete => PermissionSet::DELETE,
            Permission::SelfDelete => PermissionSet::SELF_DELETE,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// An order-independent combination of [`Permission`]s.
    ///
    /// Backed by a `u16` bitmask, so membership and containment are O(1).
    ///
    /// # Example
    ///
    /// ```
    /// use sentinel_rbac::permissions::{Permission, PermissionSet};
    ///
    /// let mut set = PermissionSet::empty();
    /// set.add(Permission::Read);
    /// set.add(Permission::Create);
    ///
    /// assert!(set.has(Permission::Read));
    /// assert!(!set.has(Permission::SelfRead));
    /// assert_eq!(set.len(), 2);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PermissionSet: u16 {
        const CREATE = 1 << 0;
        const SELF_CREATE = 1 << 1;
        const READ = 1 << 2;
        const SELF_READ = 1 << 3;
        const UPDATE = 1 << 4;
        const SELF_UPDATE = 1 << 5;
        const DELETE = 1 << 6;
        const SELF_DELETE = 1 << 7;
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl PermissionSet {
    /// Add a permission to the set.
    pub fn add(&mut self, permission: Permission) {
        self.insert(permission.flag());
    }

    /// Check if the set holds a permission.
    pub fn has(&self, permission: Permission) -> bool {
        self.contains(permission.flag())
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: PermissionSet) {
        self.insert(other);
    }

    /// Check if this set holds every permission of `other`.
    ///
    /// An empty `other` is always contained.
    pub fn contains_all(&self, other: PermissionSet) -> bool {
        self.contains(other)
    }

    /// Check if this set holds at least one permission of `other`.
    pub fn contains_any(&self, other: PermissionSet) -> bool {
        self.intersects(other)
    }

    /// Number of permissions in the set.
    pub fn len(&self) -> usize {
        self.bits().count_ones() as usize
    }

    /// The permissions in the set, in flag order.
    pub fn permissions(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::all().into_iter().filter(move |p| self.has(*p))
    }
}

impl From<Permission> for PermissionSet {
    fn from(permission: Permission) -> Self {
        permission.flag()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        let mut set = PermissionSet::empty();
        for permission in iter {
            set.add(permission);
        }
        set
    }
}

/// Check that `permitted` covers every permission in `required`.
///
/// This is containment, not equality: `permitted` may hold more. An empty
/// `required` set is always satisfied.
///
/// # Example
///
/// ```
/// use sentinel_rbac::permissions::{satisfies, PermissionSet};
///
/// let required = PermissionSet::READ;
/// assert!(satisfies(required, PermissionSet::READ | PermissionSet::CREATE));
/// assert!(!satisfies(required, PermissionSet::SELF_READ));
/// ```
pub fn satisfies(required: PermissionSet, permitted: PermissionSet) -> bool {
    permitted.contains(required)
}
