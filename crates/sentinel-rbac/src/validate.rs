//! Integrity checks for schemas and hosts
//!
//! Schema checks run before host checks, and within a schema the default
//! roles are checked before any action-gate rule, so an error always names
//! the most local scope it can.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult, RefKind};
use crate::host::Host;
use crate::policy::RuleKey;
use crate::role::Role;
use crate::schema::Schema;

/// Check that every default role exists among `roles`.
pub(crate) fn validate_default_roles(
    roles: &[Role],
    default_roles: &[Role],
    scope: &str,
) -> ConfigResult<()> {
    for default_role in default_roles {
        if !roles.iter().any(|role| role.name == default_role.name) {
            return Err(ConfigError::UnknownDefaultRole {
                role: default_role.name.clone(),
                scope: scope.to_string(),
            });
        }
    }
    Ok(())
}

/// Check that no name repeats.
pub(crate) fn ensure_unique<'a>(
    names: impl IntoIterator<Item = &'a str>,
    kind: RefKind,
    scope: &str,
) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName {
                kind,
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }
    }
    Ok(())
}

/// Check that every rule of the schema's policy only references entities,
/// actions, resources and roles the schema declares.
fn validate_policy(schema: &Schema) -> ConfigResult<()> {
    let undeclared = |rule: &RuleKey, kind: RefKind, name: &str| {
        ConfigError::UndeclaredReference {
            rule: rule.clone(),
            kind,
            name: name.to_string(),
            schema: schema.id().to_string(),
        }
    };

    for (key, rule) in schema.policy().rules() {
        rule.validate()?;

        let entity = schema
            .entity(&rule.entity)
            .ok_or_else(|| undeclared(key, RefKind::Entity, &rule.entity))?;

        if !entity.has_action(&rule.action) {
            return Err(undeclared(key, RefKind::Action, rule.action.as_str()));
        }

        if schema.resource(rule.resource.name()).is_none() {
            return Err(undeclared(key, RefKind::Resource, rule.resource.name()));
        }

        for role in &rule.roles {
            if !schema.roles().iter().any(|r| r.name == role.name) {
                return Err(undeclared(key, RefKind::Role, &role.name));
            }
        }
    }

    Ok(())
}

/// Validate a single schema.
pub fn validate_schema(schema: &Schema) -> ConfigResult<()> {
    debug!(schema = %schema.id(), "Validating schema");

    if schema.id().is_empty() {
        return Err(ConfigError::MissingSchemaId);
    }

    let scope = schema.scope();

    validate_default_roles(schema.roles(), schema.default_roles(), &scope)?;

    ensure_unique(schema.roles().iter().map(|r| r.name.as_str()), RefKind::Role, &scope)?;
    ensure_unique(schema.entities().iter().map(|e| e.name()), RefKind::Entity, &scope)?;
    ensure_unique(schema.resources().iter().map(|r| r.name()), RefKind::Resource, &scope)?;

    validate_policy(schema)?;

    debug!(schema = %schema.id(), rules = schema.policy().len(), "Schema is valid");

    Ok(())
}

/// Validate a host: every schema first, then the host's own roles.
pub fn validate_host(host: &Host) -> ConfigResult<()> {
    debug!(schemas = host.schemas().len(), "Validating host");

    if host.schemas().is_empty() {
        return Err(ConfigError::NoSchemas);
    }

    for schema in host.schemas() {
        validate_schema(schema)?;
    }

    ensure_unique(host.schemas().iter().map(|s| s.id()), RefKind::Schema, "host")?;
    ensure_unique(
        host.global_roles().iter().map(|r| r.name.as_str()),
        RefKind::Role,
        "host",
    )?;
    validate_default_roles(host.global_roles(), host.default_roles(), "host")?;

    debug!("Host is valid");

    Ok(())
}
