//! Error types for configuration building and authorization decisions
//!
//! Configuration errors abort the build of a host or schema. Authorization
//! errors are returned per request and are recoverable by the caller.

use thiserror::Error;

use crate::policy::RuleKey;

/// The kind of object a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Role,
    Entity,
    Action,
    Resource,
    Schema,
}

impl RefKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Role => "role",
            RefKind::Entity => "entity",
            RefKind::Action => "action",
            RefKind::Resource => "resource",
            RefKind::Schema => "schema",
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration error types.
///
/// Raised while building or validating a [`Host`](crate::Host) or
/// [`Schema`](crate::Schema). There is no partial result: any of these
/// aborts the build.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Entity already declares an action with this name
    #[error("\"{entity}\" entity already has \"{action}\" action")]
    DuplicateAction { entity: String, action: String },

    /// A rule is already bound to this entity/action/resource
    #[error("rule {key} already exists in action gate policy")]
    DuplicateRule { key: RuleKey },

    /// Rule is missing one of its required fields
    #[error("invalid action gate rule: {0} is missing")]
    InvalidRule(&'static str),

    /// Effect is not one of deny, require, allow
    #[error("action gate effect \"{0}\" doesn't exist")]
    InvalidEffect(String),

    /// A name could not be resolved while normalizing
    #[error("{kind} \"{name}\" referenced in {scope} doesn't exist")]
    UnresolvedReference {
        kind: RefKind,
        name: String,
        scope: String,
    },

    /// Default role is not among the roles of its scope
    #[error("invalid default role \"{role}\" in {scope}: there is no such role")]
    UnknownDefaultRole { role: String, scope: String },

    /// Action-gate rule references something its schema doesn't declare
    #[error("invalid action gate rule {rule}: {kind} \"{name}\" doesn't exist in the \"{schema}\" schema")]
    UndeclaredReference {
        rule: RuleKey,
        kind: RefKind,
        name: String,
        schema: String,
    },

    /// Name declared twice in the same scope
    #[error("{kind} \"{name}\" is declared more than once in {scope}")]
    DuplicateName {
        kind: RefKind,
        name: String,
        scope: String,
    },

    /// Host without schemas
    #[error("at least one schema must be defined")]
    NoSchemas,

    /// Schema declared without an id
    #[error("schema id must not be empty")]
    MissingSchemaId,

    /// Rule without `having` in a scope that defines no roles
    #[error("action gate rule in {scope} applies to any role, but {scope} defines no roles")]
    NoRolesInScope { scope: String },

    /// Document could not be decoded
    #[error("failed to parse RBAC configuration: {0}")]
    Parse(String),

    /// Document could not be read
    #[error("failed to read RBAC configuration: {0}")]
    Io(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Get error code for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::DuplicateAction { .. } => "DUPLICATE_ACTION",
            ConfigError::DuplicateRule { .. } => "DUPLICATE_RULE",
            ConfigError::InvalidRule(_) => "INVALID_RULE",
            ConfigError::InvalidEffect(_) => "INVALID_EFFECT",
            ConfigError::UnresolvedReference { .. } => "UNRESOLVED_REFERENCE",
            ConfigError::UnknownDefaultRole { .. } => "UNKNOWN_DEFAULT_ROLE",
            ConfigError::UndeclaredReference { .. } => "UNDECLARED_REFERENCE",
            ConfigError::DuplicateName { .. } => "DUPLICATE_NAME",
            ConfigError::NoSchemas => "NO_SCHEMAS",
            ConfigError::MissingSchemaId => "MISSING_SCHEMA_ID",
            ConfigError::NoRolesInScope { .. } => "NO_ROLES_IN_SCOPE",
            ConfigError::Parse(_) => "PARSE_ERROR",
            ConfigError::Io(_) => "IO_ERROR",
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

/// Authorization error types.
///
/// Returned to the immediate caller of a decision or lookup. The engine
/// never logs or retries these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// Entity doesn't declare the requested action
    #[error("entity \"{entity}\" doesn't have \"{action}\" action")]
    EntityLacksAction { entity: String, action: String },

    /// An action-gate rule rejected the caller
    #[error("action has been denied by action gate policy ({rule})")]
    ActionDeniedByPolicy { rule: RuleKey },

    /// Caller's merged permissions don't cover the requirement
    #[error("insufficient permissions to perform this action")]
    InsufficientPermissions,

    /// Schema id is empty or unknown
    #[error("schema \"{0}\" wasn't found")]
    SchemaNotFound(String),

    /// Role name is unknown in the scope
    #[error("{scope} doesn't have role \"{role}\"")]
    RoleNotFound { scope: String, role: String },

    /// Entity name is unknown in the schema
    #[error("schema \"{schema}\" doesn't have entity \"{entity}\"")]
    UnknownEntity { schema: String, entity: String },

    /// Resource name is unknown in the schema
    #[error("schema \"{schema}\" doesn't have resource \"{resource}\"")]
    UnknownResource { schema: String, resource: String },
}

/// Result type for authorization operations.
pub type AuthzResult<T> = Result<T, AuthzError>;

impl AuthzError {
    /// Check if this error is a denial of an otherwise well-formed request.
    ///
    /// Lookup failures (unknown schema, role, entity, resource or action)
    /// are not denials.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AuthzError::ActionDeniedByPolicy { .. } | AuthzError::InsufficientPermissions
        )
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthzError::EntityLacksAction { .. } => "ENTITY_LACKS_ACTION",
            AuthzError::ActionDeniedByPolicy { .. } => "ACTION_DENIED_BY_POLICY",
            AuthzError::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            AuthzError::SchemaNotFound(_) => "SCHEMA_NOT_FOUND",
            AuthzError::RoleNotFound { .. } => "ROLE_NOT_FOUND",
            AuthzError::UnknownEntity { .. } => "UNKNOWN_ENTITY",
            AuthzError::UnknownResource { .. } => "UNKNOWN_RESOURCE",
        }
    }
}
