//! # Action-Gate Policy
//!
//! Explicit rules that override the default permission check for one
//! concrete (entity, action, resource) triple.
//!
//! ## Effects
//!
//! | effect    | caller holds a rule role        | caller holds none            |
//! |-----------|---------------------------------|------------------------------|
//! | `deny`    | denied                          | default check                |
//! | `require` | default check                   | denied                       |
//! | `allow`   | granted, default check skipped  | default check                |
//!
//! `require` narrows who is eligible; it never grants on its own.
//!
//! ## Keys
//!
//! Rules are keyed by [`RuleKey`], a typed triple rather than a joined
//! string, so names containing `:` can't collide. Lookup is exact; there are
//! no wildcards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::context::AuthorizationContext;
use crate::entity::Action;
use crate::error::{AuthzError, AuthzResult, ConfigError, ConfigResult};
use crate::resource::Resource;
use crate::role::Role;

/// What a rule does when it matches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionGateEffect {
    /// Deny the action, even if it would be authorized.
    Deny,
    /// Deny the action unless the caller holds one of the rule roles.
    Require,
    /// Authorize the action immediately for callers holding a rule role.
    Allow,
}

impl ActionGateEffect {
    /// Get the configuration name of the effect.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionGateEffect::Deny => "deny",
            ActionGateEffect::Require => "require",
            ActionGateEffect::Allow => "allow",
        }
    }
}

impl FromStr for ActionGateEffect {
    type Err = ConfigError;

    /// Parse an effect from its exact configuration name.
    ///
    /// ```
    /// use sentinel_rbac::ActionGateEffect;
    ///
    /// assert_eq!("deny".parse::<ActionGateEffect>().unwrap(), ActionGateEffect::Deny);
    /// assert!("Deny".parse::<ActionGateEffect>().is_err());
    /// assert!("grant".parse::<ActionGateEffect>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deny" => Ok(ActionGateEffect::Deny),
            "require" => Ok(ActionGateEffect::Require),
            "allow" => Ok(ActionGateEffect::Allow),
            _ => Err(ConfigError::InvalidEffect(s.to_string())),
        }
    }
}

impl std::fmt::Display for ActionGateEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup key of an action-gate rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleKey {
    /// Entity name.
    pub entity: String,
    /// Action name.
    pub action: Action,
    /// Resource name.
    pub resource: String,
}

impl RuleKey {
    /// Create a new key.
    pub fn new(entity: impl Into<String>, action: Action, resource: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            action,
            resource: resource.into(),
        }
    }
}

impl std::fmt::Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.entity, self.action, self.resource)
    }
}

/// A single action-gate rule.
///
/// All fields are required; [`ActionGatePolicy::add_rule`] rejects a rule
/// with an empty name or no roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGateRule {
    /// Name of the entity the rule applies to.
    pub entity: String,
    /// What happens when the rule matches.
    pub effect: ActionGateEffect,
    /// Roles the rule is conditioned on. Must not be empty.
    pub roles: Vec<Role>,
    /// Action the rule gates.
    pub action: Action,
    /// Resource the rule is scoped to.
    pub resource: Resource,
}

impl ActionGateRule {
    /// Create a rule for the given context.
    ///
    /// # Example
    ///
    /// ```
    /// use sentinel_rbac::*;
    ///
    /// let mut user = Entity::new("user");
    /// let delete = user.new_action("delete", PermissionSet::DELETE).unwrap();
    /// let cache = Resource::new("cache");
    /// let ctx = AuthorizationContext::new(&user, delete, &cache);
    ///
    /// let admin = Role::new("admin", PermissionSet::all());
    /// let rule = ActionGateRule::new(&ctx, ActionGateEffect::Require, vec![admin]);
    /// assert_eq!(rule.key().to_string(), "user:delete:cache");
    /// ```
    pub fn new(ctx: &AuthorizationContext<'_>, effect: ActionGateEffect, roles: Vec<Role>) -> Self {
        Self {
            entity: ctx.entity.name().to_string(),
            effect,
            roles,
            action: ctx.action.clone(),
            resource: ctx.resource.clone(),
        }
    }

    /// The policy key of this rule.
    pub fn key(&self) -> RuleKey {
        RuleKey::new(self.entity.clone(), self.action.clone(), self.resource.name())
    }

    /// Check that every required field is present.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.roles.is_empty() {
            return Err(ConfigError::InvalidRule("roles"));
        }
        if self.entity.is_empty() {
            return Err(ConfigError::InvalidRule("entity"));
        }
        if self.action.is_empty() {
            return Err(ConfigError::InvalidRule("action"));
        }
        if self.resource.name().is_empty() {
            return Err(ConfigError::InvalidRule("resource"));
        }
        Ok(())
    }

    /// Check if any of the caller's roles is one of the rule roles.
    pub fn matches_roles(&self, roles: &[Role]) -> bool {
        roles
            .iter()
            .any(|role| self.roles.iter().any(|rule_role| rule_role.name == role.name))
    }

    /// Apply this rule to an attempted action.
    ///
    /// Returns `Ok(true)` when the default permission check must be skipped
    /// (an `allow` rule matched), `Ok(false)` when the default check must
    /// still run. A rule bound to a different action passes through.
    ///
    /// # Errors
    ///
    /// [`AuthzError::ActionDeniedByPolicy`] when a `deny` rule matches the
    /// caller, or a `require` rule doesn't.
    pub fn apply(&self, action: &Action, roles: &[Role]) -> AuthzResult<bool> {
        if &self.action != action {
            return Ok(false);
        }

        let role_match = self.matches_roles(roles);

        match self.effect {
            ActionGateEffect::Deny if role_match => Err(self.denied()),
            ActionGateEffect::Require if !role_match => Err(self.denied()),
            ActionGateEffect::Allow => Ok(role_match),
            _ => Ok(false),
        }
    }

    fn denied(&self) -> AuthzError {
        AuthzError::ActionDeniedByPolicy { rule: self.key() }
    }
}

/// Lookup of action-gate rules for a context.
///
/// Implemented by [`ActionGatePolicy`] and [`Schema`](crate::Schema) so the
/// authorizer can take whichever rule source the caller holds.
pub trait RuleProvider {
    /// Find the rule bound to this context, if any.
    fn get_rule(&self, ctx: &AuthorizationContext<'_>) -> Option<&ActionGateRule>;
}

/// A table of action-gate rules with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionGatePolicy {
    rules: BTreeMap<RuleKey, ActionGateRule>,
}

impl ActionGatePolicy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidRule`] if a required field is missing
    /// - [`ConfigError::DuplicateRule`] if a rule is already bound to the
    ///   same entity, action and resource; the existing rule is kept
    pub fn add_rule(&mut self, rule: ActionGateRule) -> ConfigResult<()> {
        rule.validate()?;

        let key = rule.key();

        if self.rules.contains_key(&key) {
            return Err(ConfigError::DuplicateRule { key });
        }

        self.rules.insert(key, rule);

        Ok(())
    }

    /// Find the rule bound to a context.
    pub fn get_rule(&self, ctx: &AuthorizationContext<'_>) -> Option<&ActionGateRule> {
        self.rules.get(&ctx.key())
    }

    /// Find a rule by key.
    pub fn rule(&self, key: &RuleKey) -> Option<&ActionGateRule> {
        self.rules.get(key)
    }

    /// Iterate over all rules in key order.
    pub fn rules(&self) -> impl Iterator<Item = (&RuleKey, &ActionGateRule)> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the policy has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleProvider for ActionGatePolicy {
    fn get_rule(&self, ctx: &AuthorizationContext<'_>) -> Option<&ActionGateRule> {
        ActionGatePolicy::get_rule(self, ctx)
    }
}
