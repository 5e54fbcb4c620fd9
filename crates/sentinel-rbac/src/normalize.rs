//! Normalization of configuration documents
//!
//! Turns [`RawHost`]/[`RawSchema`] into validated [`Host`]/[`Schema`] values.
//! Every name is resolved here; the first one that can't be resolved aborts
//! the build with a [`ConfigError::UnresolvedReference`]. Nothing is
//! dropped silently.
//!
//! Order within a schema: roles (merged with global roles), default roles,
//! entities, resources, then action-gate rules. Schemas are normalized
//! before the host's own default roles are resolved.

use tracing::debug;

use crate::entity::{Action, Entity};
use crate::error::{ConfigError, ConfigResult, RefKind};
use crate::host::Host;
use crate::policy::{ActionGateEffect, ActionGatePolicy, ActionGateRule};
use crate::raw::{RawEntity, RawHost, RawRole, RawRule, RawSchema};
use crate::resource::Resource;
use crate::role::{find_role, merge_roles, Role};
use crate::schema::Schema;
use crate::validate::ensure_unique;

fn roles_from_raw(raw: &[RawRole], scope: &str) -> ConfigResult<Vec<Role>> {
    ensure_unique(raw.iter().map(|r| r.name.as_str()), RefKind::Role, scope)?;

    Ok(raw
        .iter()
        .map(|r| Role::new(r.name.clone(), r.permissions.to_permission_set()))
        .collect())
}

fn default_roles_from_names(roles: &[Role], names: &[String], scope: &str) -> ConfigResult<Vec<Role>> {
    names
        .iter()
        .map(|name| {
            find_role(roles, name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownDefaultRole {
                    role: name.clone(),
                    scope: scope.to_string(),
                })
        })
        .collect()
}

fn entity_from_raw(raw: &RawEntity) -> ConfigResult<Entity> {
    let mut entity = Entity::new(raw.name.clone());
    for action in &raw.actions {
        entity.new_action(action.name.clone(), action.permissions.to_permission_set())?;
    }
    Ok(entity)
}

fn unresolved(kind: RefKind, name: &str, scope: &str) -> ConfigError {
    ConfigError::UnresolvedReference {
        kind,
        name: name.to_string(),
        scope: scope.to_string(),
    }
}

/// Expand one raw rule into the policy, one rule per entity and action.
fn add_raw_rule(
    policy: &mut ActionGatePolicy,
    raw: &RawRule,
    roles: &[Role],
    entities: &[Entity],
    resources: &[Resource],
    scope: &str,
) -> ConfigResult<()> {
    let effect: ActionGateEffect = raw.effect.parse()?;

    if raw.entities.is_empty() {
        return Err(ConfigError::InvalidRule("entity"));
    }
    if raw.actions.is_empty() {
        return Err(ConfigError::InvalidRule("action"));
    }
    if raw.resource.is_empty() {
        return Err(ConfigError::InvalidRule("resource"));
    }

    let resource = resources
        .iter()
        .find(|r| r.name() == raw.resource)
        .ok_or_else(|| unresolved(RefKind::Resource, &raw.resource, scope))?;

    let rule_roles = if raw.roles.is_empty() {
        if roles.is_empty() {
            return Err(ConfigError::NoRolesInScope {
                scope: scope.to_string(),
            });
        }
        roles.to_vec()
    } else {
        raw.roles
            .iter()
            .map(|name| {
                find_role(roles, name)
                    .cloned()
                    .ok_or_else(|| unresolved(RefKind::Role, name, scope))
            })
            .collect::<ConfigResult<Vec<_>>>()?
    };

    for entity_name in &raw.entities {
        let entity = entities
            .iter()
            .find(|e| e.name() == entity_name)
            .ok_or_else(|| unresolved(RefKind::Entity, entity_name, scope))?;

        for action_name in &raw.actions {
            let action = Action::new(action_name.clone());
            if !entity.has_action(&action) {
                return Err(unresolved(
                    RefKind::Action,
                    action_name,
                    &format!("entity \"{}\" of {}", entity.name(), scope),
                ));
            }

            policy.add_rule(ActionGateRule {
                entity: entity.name().to_string(),
                effect,
                roles: rule_roles.clone(),
                action,
                resource: resource.clone(),
            })?;
        }
    }

    Ok(())
}

/// Normalize a schema document against the host's global roles.
///
/// Pass an empty `global_roles` for a standalone schema.
pub fn normalize_schema(raw: &RawSchema, global_roles: &[Role]) -> ConfigResult<Schema> {
    let scope = format!("schema \"{}\"", raw.id);
    debug!(schema = %raw.id, "Normalizing schema");

    let own_roles = roles_from_raw(&raw.roles, &scope)?;
    let roles = merge_roles(global_roles, &own_roles);
    let default_roles = default_roles_from_names(&roles, &raw.default_roles, &scope)?;

    let entities = raw
        .entities
        .iter()
        .map(entity_from_raw)
        .collect::<ConfigResult<Vec<_>>>()?;

    let resources: Vec<Resource> = raw.resources.iter().map(Resource::new).collect();

    let mut policy = ActionGatePolicy::new();
    for rule in &raw.action_gate_policy {
        add_raw_rule(&mut policy, rule, &roles, &entities, &resources, &scope)?;
    }

    Schema::builder(raw.id.clone())
        .name(raw.name.clone())
        .roles(roles)
        .entities(entities)
        .resources(resources)
        .default_roles(default_roles)
        .policy(policy)
        .build()
}

/// Normalize a host document.
///
/// Each schema's roles are merged with the global roles (schema
/// declarations win for shared names) before the schema is normalized.
pub fn normalize_host(raw: &RawHost) -> ConfigResult<Host> {
    debug!(schemas = raw.schemas.len(), "Normalizing host");

    let global_roles = roles_from_raw(&raw.roles, "host")?;

    let schemas = raw
        .schemas
        .iter()
        .map(|schema| normalize_schema(schema, &global_roles))
        .collect::<ConfigResult<Vec<_>>>()?;

    let default_roles = default_roles_from_names(&global_roles, &raw.default_roles, "host")?;

    Host::new(global_roles, default_roles, schemas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionSet;
    use crate::raw::{RawAction, RawPermissions};

    fn raw_role(name: &str, permissions: PermissionSet) -> RawRole {
        RawRole {
            name: name.to_string(),
            permissions: permissions.into(),
        }
    }

    fn raw_schema() -> RawSchema {
        RawSchema {
            id: "users-service".into(),
            roles: vec![
                raw_role("admin", PermissionSet::all()),
                raw_role("user", PermissionSet::SELF_READ),
            ],
            entities: vec![RawEntity {
                name: "user".into(),
                actions: vec![RawAction {
                    name: "read".into(),
                    permissions: RawPermissions {
                        read: true,
                        ..Default::default()
                    },
                }],
            }],
            resources: vec!["cache".into()],
            ..Default::default()
        }
    }

    fn raw_rule(effect: &str, roles: &[&str]) -> RawRule {
        RawRule {
            entities: vec!["user".into()],
            roles: roles.iter().map(|r| r.to_string()).collect(),
            effect: effect.into(),
            actions: vec!["read".into()],
            resource: "cache".into(),
        }
    }

    #[test]
    fn test_normalize_schema() {
        let mut raw = raw_schema();
        raw.default_roles = vec!["user".into()];
        raw.action_gate_policy = vec![raw_rule("deny", &["admin"])];

        let schema = normalize_schema(&raw, &[]).unwrap();

        assert_eq!(schema.roles().len(), 2);
        assert_eq!(schema.default_roles()[0].name, "user");
        assert_eq!(
            schema
                .entity("user")
                .unwrap()
                .required_permissions(&Action::new("read")),
            Some(PermissionSet::READ)
        );

        let ctx = schema.context("user", "read", "cache").unwrap();
        let rule = schema.policy().get_rule(&ctx).unwrap();
        assert_eq!(rule.effect, ActionGateEffect::Deny);
        assert_eq!(rule.roles, vec![Role::new("admin", PermissionSet::all())]);
    }

    #[test]
    fn test_empty_having_means_any_role() {
        let mut raw = raw_schema();
        raw.action_gate_policy = vec![raw_rule("require", &[])];

        let schema = normalize_schema(&raw, &[]).unwrap();
        let ctx = schema.context("user", "read", "cache").unwrap();
        assert_eq!(schema.policy().get_rule(&ctx).unwrap().roles.len(), 2);
    }

    #[test]
    fn test_empty_having_without_roles() {
        let mut raw = raw_schema();
        raw.roles.clear();
        raw.action_gate_policy = vec![raw_rule("deny", &[])];

        let err = normalize_schema(&raw, &[]).unwrap_err();
        assert_eq!(err.error_code(), "NO_ROLES_IN_SCOPE");
        assert!(matches!(
            err,
            ConfigError::NoRolesInScope { ref scope } if scope == "schema \"users-service\""
        ));

        // global roles count as the schema's roles
        let global = vec![Role::new("user", PermissionSet::SELF_READ)];
        assert!(normalize_schema(&raw, &global).is_ok());
    }

    #[test]
    fn test_rule_expands_per_entity_and_action() {
        let mut raw = raw_schema();
        raw.entities[0].actions.push(RawAction {
            name: "delete".into(),
            permissions: RawPermissions {
                delete: true,
                ..Default::default()
            },
        });
        raw.entities.push(RawEntity {
            name: "post".into(),
            actions: vec![
                RawAction {
                    name: "read".into(),
                    ..Default::default()
                },
                RawAction {
                    name: "delete".into(),
                    ..Default::default()
                },
            ],
        });

        let mut rule = raw_rule("allow", &["admin"]);
        rule.entities = vec!["user".into(), "post".into()];
        rule.actions = vec!["read".into(), "delete".into()];
        raw.action_gate_policy = vec![rule];

        let schema = normalize_schema(&raw, &[]).unwrap();
        assert_eq!(schema.policy().len(), 4);
    }

    #[test]
    fn test_unresolved_references() {
        let cases = [
            (raw_rule("deny", &["ghost"]), RefKind::Role, "ghost"),
            (
                RawRule {
                    resource: "database".into(),
                    ..raw_rule("deny", &["admin"])
                },
                RefKind::Resource,
                "database",
            ),
            (
                RawRule {
                    entities: vec!["invoice".into()],
                    ..raw_rule("deny", &["admin"])
                },
                RefKind::Entity,
                "invoice",
            ),
            (
                RawRule {
                    actions: vec!["fly".into()],
                    ..raw_rule("deny", &["admin"])
                },
                RefKind::Action,
                "fly",
            ),
        ];

        for (rule, expected_kind, expected_name) in cases {
            let mut raw = raw_schema();
            raw.action_gate_policy = vec![rule];

            let err = normalize_schema(&raw, &[]).unwrap_err();
            match err {
                ConfigError::UnresolvedReference { kind, name, .. } => {
                    assert_eq!(kind, expected_kind);
                    assert_eq!(name, expected_name);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_invalid_effect() {
        let mut raw = raw_schema();
        raw.action_gate_policy = vec![raw_rule("grant", &["admin"])];

        let err = normalize_schema(&raw, &[]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEffect(ref v) if v == "grant"));
    }

    #[test]
    fn test_rule_without_actions() {
        let mut raw = raw_schema();
        let mut rule = raw_rule("deny", &["admin"]);
        rule.actions.clear();
        raw.action_gate_policy = vec![rule];

        assert!(matches!(
            normalize_schema(&raw, &[]),
            Err(ConfigError::InvalidRule("action"))
        ));
    }

    #[test]
    fn test_duplicate_rule_in_document() {
        let mut raw = raw_schema();
        raw.action_gate_policy = vec![raw_rule("deny", &["admin"]), raw_rule("allow", &["user"])];

        assert!(matches!(
            normalize_schema(&raw, &[]),
            Err(ConfigError::DuplicateRule { .. })
        ));
    }

    #[test]
    fn test_duplicate_action_in_document() {
        let mut raw = raw_schema();
        let read = raw.entities[0].actions[0].clone();
        raw.entities[0].actions.push(read);

        assert!(matches!(
            normalize_schema(&raw, &[]),
            Err(ConfigError::DuplicateAction { .. })
        ));
    }

    #[test]
    fn test_duplicate_role_in_document() {
        let mut raw = raw_schema();
        raw.roles.push(raw_role("admin", PermissionSet::READ));

        assert!(matches!(
            normalize_schema(&raw, &[]),
            Err(ConfigError::DuplicateName { kind: RefKind::Role, .. })
        ));
    }

    #[test]
    fn test_unknown_default_role_reported_before_rules() {
        let mut raw = raw_schema();
        raw.default_roles = vec!["moderator".into()];
        // would also fail, but must not be reached
        raw.action_gate_policy = vec![raw_rule("grant", &["ghost"])];

        let err = normalize_schema(&raw, &[]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownDefaultRole { ref role, .. } if role == "moderator"
        ));
    }

    #[test]
    fn test_schema_roles_override_globals() {
        let global = vec![Role::new("user", PermissionSet::SELF_READ)];
        let mut raw = raw_schema();
        raw.roles = vec![raw_role("user", PermissionSet::READ)];

        let schema = normalize_schema(&raw, &global).unwrap();
        assert_eq!(
            schema.parse_role("user").unwrap().permissions,
            PermissionSet::READ
        );
        assert_eq!(global[0].permissions, PermissionSet::SELF_READ);
    }

    #[test]
    fn test_normalize_host() {
        let raw = RawHost {
            default_roles: vec!["user".into()],
            roles: vec![
                raw_role("user", PermissionSet::SELF_READ),
                raw_role("support", PermissionSet::READ),
            ],
            schemas: vec![
                RawSchema {
                    roles: vec![raw_role("user", PermissionSet::READ)],
                    ..raw_schema()
                },
                RawSchema {
                    id: "billing".into(),
                    ..Default::default()
                },
            ],
        };

        let host = normalize_host(&raw).unwrap();
        assert_eq!(host.default_roles()[0].name, "user");

        let users = host.get_schema("users-service").unwrap();
        assert_eq!(users.parse_role("user").unwrap().permissions, PermissionSet::READ);
        assert!(users.parse_role("support").is_ok());

        let billing = host.get_schema("billing").unwrap();
        assert_eq!(billing.roles(), host.global_roles());
    }

    #[test]
    fn test_schema_error_reported_before_host_default_roles() {
        let raw = RawHost {
            default_roles: vec!["ghost".into()],
            roles: vec![raw_role("user", PermissionSet::SELF_READ)],
            schemas: vec![RawSchema {
                default_roles: vec!["phantom".into()],
                ..raw_schema()
            }],
        };

        let err = normalize_host(&raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownDefaultRole { ref role, ref scope }
                if role == "phantom" && scope == "schema \"users-service\""
        ));
    }

    #[test]
    fn test_host_without_schemas() {
        let raw = RawHost {
            roles: vec![raw_role("user", PermissionSet::SELF_READ)],
            ..Default::default()
        };
        assert!(matches!(normalize_host(&raw), Err(ConfigError::NoSchemas)));
    }
}
