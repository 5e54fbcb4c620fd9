//! # Sentinel RBAC (Role-Based Access Control)
//!
//! An embeddable authorization engine: given a validated configuration of
//! roles, entities, actions and resources, it answers whether a set of roles
//! may perform an action on an entity in a resource.
//!
//! ## Overview
//!
//! The sentinel-rbac crate handles:
//! - **Permissions**: a fixed vocabulary of eight CRUD flags (each with a
//!   `self-` variant) combined into [`PermissionSet`]s
//! - **Roles**: named permission sets, global to a host or local to a schema
//! - **Entities**: things acted upon, each declaring the permissions its
//!   actions require
//! - **Action-Gate Policy**: per entity/action/resource overrides that deny,
//!   require or allow specific roles before the permission check runs
//! - **Schemas and Hosts**: validated, read-only scopes built from a JSON
//!   document
//!
//! ## Architecture
//!
//! ```text
//! RBAC.json ──serde──▶ RawHost ──normalize──▶ Host ──validate──▶ ready
//!                                              │
//!                       Schema::authorize ◀────┘
//!                              │
//!                      Authorizer::decide
//!                1. entity declares the action?
//!                2. action-gate rule (deny / require / allow)
//!                3. strategy(required, merged role permissions)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use sentinel_rbac::*;
//!
//! let host = host_from_str(r#"{
//!     "roles": [
//!         { "name": "user",  "permissions": { "self-read": true } },
//!         { "name": "admin", "permissions": { "read": true, "delete": true } }
//!     ],
//!     "default-roles": ["user"],
//!     "schemas": [{
//!         "id": "users-service",
//!         "entities": [{
//!             "name": "user",
//!             "actions": [
//!                 { "name": "read",   "permissions": { "read": true } },
//!                 { "name": "delete", "permissions": { "delete": true } }
//!             ]
//!         }],
//!         "resources": ["cache"],
//!         "action-gate-policy": [
//!             { "for": ["user"], "having": ["admin"], "apply": "deny", "doing": ["delete"], "on": "cache" }
//!         ]
//!     }]
//! }"#).unwrap();
//!
//! let schema = host.get_schema("users-service").unwrap();
//! let authorizer = Authorizer::new();
//!
//! assert!(schema.authorize(&authorizer, "user", "read", "cache", &["admin"]).is_ok());
//! assert!(schema.authorize(&authorizer, "user", "read", "cache", &["user"]).is_err());
//! assert!(matches!(
//!     schema.authorize(&authorizer, "user", "delete", "cache", &["admin"]),
//!     Err(AuthzError::ActionDeniedByPolicy { .. })
//! ));
//! ```
//!
//! ## Reloading
//!
//! A [`Host`] never changes after it is built. Wrap it in a [`SharedHost`]
//! to replace the whole configuration at runtime while in-flight requests
//! keep their snapshot.

pub mod authorizer;
pub mod context;
pub mod entity;
pub mod error;
pub mod host;
pub mod loader;
pub mod normalize;
pub mod permissions;
pub mod policy;
pub mod raw;
pub mod resource;
pub mod role;
pub mod schema;
pub mod validate;

// Re-export main types for convenience
pub use authorizer::{Authorizer, AuthzStrategy, CrudStrategy};
pub use context::AuthorizationContext;
pub use entity::{Action, Entity};
pub use error::{AuthzError, AuthzResult, ConfigError, ConfigResult, RefKind};
pub use host::{Host, SharedHost};
pub use loader::{
    host_from_slice, host_from_str, load_host, load_host_with, load_schema, schema_from_slice,
    schema_from_str, LoaderConfig,
};
pub use permissions::{satisfies, Permission, PermissionSet};
pub use policy::{ActionGateEffect, ActionGatePolicy, ActionGateRule, RuleKey, RuleProvider};
pub use raw::{RawAction, RawEntity, RawHost, RawPermissions, RawRole, RawRule, RawSchema};
pub use resource::Resource;
pub use role::{merge_roles, merged_permissions, role_names, Role};
pub use schema::{Schema, SchemaBuilder};
