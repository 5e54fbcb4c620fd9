//! # Host
//!
//! A host aggregates the schemas of several services together with the
//! global roles they share and the default roles every new user receives.
//!
//! A built host is read-only. To change configuration at runtime, build and
//! validate a new host, then swap it into a [`SharedHost`]; readers holding
//! the previous snapshot keep using it until they drop it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::error::{AuthzError, AuthzResult, ConfigResult};
use crate::normalize;
use crate::raw::RawHost;
use crate::role::{find_role, Role};
use crate::schema::Schema;
use crate::validate;

/// Schemas plus the roles they share.
///
/// # Example
///
/// ```
/// use sentinel_rbac::*;
///
/// let user = Role::new("user", PermissionSet::SELF_READ);
/// let schema = Schema::builder("users-service")
///     .role(user.clone())
///     .build()
///     .unwrap();
///
/// let host = Host::new(vec![user.clone()], vec![user], vec![schema]).unwrap();
/// assert!(host.get_schema("users-service").is_ok());
/// assert!(host.get_schema("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    global_roles: Vec<Role>,
    default_roles: Vec<Role>,
    schemas: Vec<Schema>,
}

impl Host {
    /// Build and validate a host.
    ///
    /// Schemas are taken as given; use [`Host::from_raw`] to merge global
    /// roles into schema roles from a configuration document.
    ///
    /// # Arguments
    ///
    /// * `global_roles` - Roles shared by all schemas
    /// * `default_roles` - Roles every new user receives, all of them global
    /// * `schemas` - At least one schema, with unique ids
    pub fn new(
        global_roles: Vec<Role>,
        default_roles: Vec<Role>,
        schemas: Vec<Schema>,
    ) -> ConfigResult<Self> {
        let host = Self {
            global_roles,
            default_roles,
            schemas,
        };

        validate::validate_host(&host)?;

        Ok(host)
    }

    /// Normalize and validate a host document.
    pub fn from_raw(raw: &RawHost) -> ConfigResult<Self> {
        normalize::normalize_host(raw)
    }

    /// Roles shared by all schemas.
    pub fn global_roles(&self) -> &[Role] {
        &self.global_roles
    }

    /// Roles every new user receives.
    pub fn default_roles(&self) -> &[Role] {
        &self.default_roles
    }

    /// All schemas, in declaration order.
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    /// Find a schema by id.
    ///
    /// # Arguments
    ///
    /// * `id` - Schema id
    ///
    /// # Returns
    ///
    /// A borrow of the schema, valid as long as the host.
    ///
    /// # Errors
    ///
    /// [`AuthzError::SchemaNotFound`] if `id` is empty or unknown.
    pub fn get_schema(&self, id: &str) -> AuthzResult<&Schema> {
        if id.is_empty() {
            return Err(AuthzError::SchemaNotFound(String::new()));
        }

        self.schemas
            .iter()
            .find(|schema| schema.id() == id)
            .ok_or_else(|| AuthzError::SchemaNotFound(id.to_string()))
    }

    /// Resolve a global role by name.
    pub fn parse_role(&self, name: &str) -> AuthzResult<Role> {
        find_role(&self.global_roles, name)
            .cloned()
            .ok_or_else(|| AuthzError::RoleNotFound {
                scope: "host".to_string(),
                role: name.to_string(),
            })
    }
}

/// A host that can be replaced while readers are using it.
///
/// Readers take a [`snapshot`](Self::snapshot) and make all decisions of one
/// request against it. [`replace`](Self::replace) swaps the whole host in one
/// step; nothing is ever mutated in place.
#[derive(Debug)]
pub struct SharedHost {
    current: ArcSwap<Host>,
}

impl SharedHost {
    /// Wrap a validated host.
    pub fn new(host: Host) -> Self {
        Self {
            current: ArcSwap::from_pointee(host),
        }
    }

    /// The host currently in effect.
    pub fn snapshot(&self) -> Arc<Host> {
        self.current.load_full()
    }

    /// Swap in a new host, returning the previous one.
    pub fn replace(&self, host: Host) -> Arc<Host> {
        let schemas = host.schemas().len();
        let previous = self.current.swap(Arc::new(host));
        info!(
            schemas,
            previous_schemas = previous.schemas().len(),
            "RBAC host replaced"
        );
        previous
    }
}

impl From<Host> for SharedHost {
    fn from(host: Host) -> Self {
        Self::new(host)
    }
}
