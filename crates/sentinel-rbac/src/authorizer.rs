//! # Authorizer
//!
//! The request-time decision. For a context and the caller's roles:
//!
//! 1. the entity must declare the action
//! 2. an action-gate rule bound to the context, if any, is applied first;
//!    it may deny, or grant and skip the rest
//! 3. the union of the caller's role permissions is compared with the
//!    action's requirement by the authorizer's [`AuthzStrategy`]
//!
//! The policy step always runs before the permission comparison, so
//! `deny` and `allow` rules can override the default outcome.

use std::fmt;
use std::sync::Arc;

use crate::context::AuthorizationContext;
use crate::error::{AuthzError, AuthzResult};
use crate::permissions::{satisfies, PermissionSet};
use crate::policy::RuleProvider;
use crate::role::{merged_permissions, Role};

/// Comparison of required permissions against the caller's permissions.
///
/// Any `Fn(PermissionSet, PermissionSet) -> AuthzResult<()>` closure is a
/// strategy.
pub trait AuthzStrategy: Send + Sync {
    /// Succeed if `permitted` is enough to perform an action requiring
    /// `required`.
    fn authorize(&self, required: PermissionSet, permitted: PermissionSet) -> AuthzResult<()>;
}

impl<F> AuthzStrategy for F
where
    F: Fn(PermissionSet, PermissionSet) -> AuthzResult<()> + Send + Sync,
{
    fn authorize(&self, required: PermissionSet, permitted: PermissionSet) -> AuthzResult<()> {
        self(required, permitted)
    }
}

/// The default strategy: every required permission must be permitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrudStrategy;

impl AuthzStrategy for CrudStrategy {
    fn authorize(&self, required: PermissionSet, permitted: PermissionSet) -> AuthzResult<()> {
        if satisfies(required, permitted) {
            Ok(())
        } else {
            Err(AuthzError::InsufficientPermissions)
        }
    }
}

/// Decision engine with an injected comparison strategy.
///
/// Cheap to clone; the strategy is shared.
///
/// # Example
///
/// ```
/// use sentinel_rbac::*;
///
/// let mut user = Entity::new("user");
/// let read = user.new_action("read", PermissionSet::READ).unwrap();
/// let cache = Resource::new("cache");
/// let ctx = AuthorizationContext::new(&user, read, &cache);
///
/// let admin = Role::new("admin", PermissionSet::READ | PermissionSet::DELETE);
/// let guest = Role::new("guest", PermissionSet::SELF_READ);
///
/// let authorizer = Authorizer::new();
/// assert!(authorizer.decide(&ctx, &[admin], None).is_ok());
/// assert_eq!(
///     authorizer.decide(&ctx, &[guest], None),
///     Err(AuthzError::InsufficientPermissions)
/// );
/// ```
#[derive(Clone)]
pub struct Authorizer {
    strategy: Arc<dyn AuthzStrategy>,
}

impl Authorizer {
    /// Create an authorizer using [`CrudStrategy`].
    pub fn new() -> Self {
        Self::with_strategy(CrudStrategy)
    }

    /// Create an authorizer with a custom comparison strategy.
    pub fn with_strategy(strategy: impl AuthzStrategy + 'static) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }

    /// Create an authorizer from a comparison function.
    pub fn from_fn<F>(strategy: F) -> Self
    where
        F: Fn(PermissionSet, PermissionSet) -> AuthzResult<()> + Send + Sync + 'static,
    {
        Self::with_strategy(strategy)
    }

    /// Decide whether the caller may perform the context's action.
    ///
    /// `policy` is consulted before the permission comparison; pass `None`
    /// to use the default comparison alone.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Entity, action and resource being attempted
    /// * `roles` - The caller's resolved roles
    /// * `policy` - Source of action-gate rules, if any
    ///
    /// # Errors
    ///
    /// - [`AuthzError::EntityLacksAction`] if the entity doesn't declare the action
    /// - [`AuthzError::ActionDeniedByPolicy`] if an action-gate rule rejects the caller
    /// - whatever the strategy returns, [`AuthzError::InsufficientPermissions`]
    ///   for the default one
    pub fn decide(
        &self,
        ctx: &AuthorizationContext<'_>,
        roles: &[Role],
        policy: Option<&dyn RuleProvider>,
    ) -> AuthzResult<()> {
        let Some(required) = ctx.entity.required_permissions(&ctx.action) else {
            return Err(AuthzError::EntityLacksAction {
                entity: ctx.entity.name().to_string(),
                action: ctx.action.to_string(),
            });
        };

        if let Some(rule) = policy.and_then(|provider| provider.get_rule(ctx)) {
            if rule.apply(&ctx.action, roles)? {
                return Ok(());
            }
        }

        self.strategy.authorize(required, merged_permissions(roles))
    }
}

impl Default for Authorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Action, Entity};
    use crate::policy::{ActionGateEffect, ActionGatePolicy, ActionGateRule};
    use crate::resource::Resource;

    fn user_entity() -> (Entity, Action, Action) {
        let mut user = Entity::new("user");
        let read = user.new_action("read", PermissionSet::READ).unwrap();
        let write = user
            .new_action("write", PermissionSet::CREATE | PermissionSet::UPDATE)
            .unwrap();
        (user, read, write)
    }

    fn admin() -> Role {
        Role::new(
            "admin",
            PermissionSet::CREATE | PermissionSet::READ | PermissionSet::UPDATE | PermissionSet::DELETE,
        )
    }

    fn policy_with(ctx: &AuthorizationContext<'_>, effect: ActionGateEffect) -> ActionGatePolicy {
        let mut policy = ActionGatePolicy::new();
        policy
            .add_rule(ActionGateRule::new(ctx, effect, vec![admin()]))
            .unwrap();
        policy
    }

    #[test]
    fn test_crud_strategy() {
        let s = CrudStrategy;
        assert!(s.authorize(PermissionSet::READ, PermissionSet::READ).is_ok());
        assert!(s
            .authorize(PermissionSet::READ, PermissionSet::READ | PermissionSet::CREATE)
            .is_ok());
        assert_eq!(
            s.authorize(PermissionSet::READ | PermissionSet::CREATE, PermissionSet::READ),
            Err(AuthzError::InsufficientPermissions)
        );
        assert!(s.authorize(PermissionSet::READ, PermissionSet::empty()).is_err());
    }

    #[test]
    fn test_default_authorization() {
        let (user, read, write) = user_entity();
        let cache = Resource::new("cache");
        let guest = Role::new("guest", PermissionSet::empty());
        let self_reader = Role::new("user", PermissionSet::SELF_READ);
        let authorizer = Authorizer::new();

        let cases: Vec<(&str, &Action, Vec<Role>, bool)> = vec![
            ("guest cannot read", &read, vec![guest], false),
            ("self-read is not read", &read, vec![self_reader.clone()], false),
            ("admin can read", &read, vec![admin()], true),
            ("user cannot write", &write, vec![self_reader.clone()], false),
            ("combined roles work", &write, vec![self_reader, admin()], true),
            ("empty roles fail", &read, vec![], false),
        ];

        for (name, action, roles, allowed) in cases {
            let ctx = AuthorizationContext::new(&user, action.clone(), &cache);
            assert_eq!(authorizer.decide(&ctx, &roles, None).is_ok(), allowed, "{name}");
        }
    }

    #[test]
    fn test_entity_lacks_action() {
        let (user, _, _) = user_entity();
        let cache = Resource::new("cache");
        let ctx = AuthorizationContext::new(&user, Action::new("fly"), &cache);

        let err = Authorizer::new().decide(&ctx, &[admin()], None).unwrap_err();
        assert_eq!(
            err,
            AuthzError::EntityLacksAction {
                entity: "user".into(),
                action: "fly".into()
            }
        );
    }

    #[test]
    fn test_unknown_action_checked_before_allow_rule() {
        let (mut user, read, _) = user_entity();
        let cache = Resource::new("cache");
        let policy = {
            let ctx = AuthorizationContext::new(&user, read.clone(), &cache);
            policy_with(&ctx, ActionGateEffect::Allow)
        };
        user.remove_action(&read);

        let ctx = AuthorizationContext::new(&user, read, &cache);
        let err = Authorizer::new()
            .decide(&ctx, &[admin()], Some(&policy))
            .unwrap_err();
        assert!(matches!(err, AuthzError::EntityLacksAction { .. }));
    }

    #[test]
    fn test_deny_overrides_permissions() {
        let (user, read, _) = user_entity();
        let cache = Resource::new("cache");
        let ctx = AuthorizationContext::new(&user, read, &cache);
        let policy = policy_with(&ctx, ActionGateEffect::Deny);

        let err = Authorizer::new()
            .decide(&ctx, &[admin()], Some(&policy))
            .unwrap_err();
        assert!(matches!(err, AuthzError::ActionDeniedByPolicy { .. }));

        // no matching role, default check applies
        let user_role = Role::new("user", PermissionSet::SELF_READ);
        assert_eq!(
            Authorizer::new().decide(&ctx, &[user_role], Some(&policy)),
            Err(AuthzError::InsufficientPermissions)
        );
    }

    #[test]
    fn test_require_gates_but_does_not_grant() {
        let (user, read, _) = user_entity();
        let cache = Resource::new("cache");
        let ctx = AuthorizationContext::new(&user, read, &cache);
        let policy = policy_with(&ctx, ActionGateEffect::Require);
        let authorizer = Authorizer::new();

        let guest = Role::new("guest", PermissionSet::all());
        assert!(matches!(
            authorizer.decide(&ctx, &[guest], Some(&policy)),
            Err(AuthzError::ActionDeniedByPolicy { .. })
        ));

        assert!(authorizer.decide(&ctx, &[admin()], Some(&policy)).is_ok());

        let powerless_admin = Role::new("admin", PermissionSet::empty());
        assert_eq!(
            authorizer.decide(&ctx, &[powerless_admin], Some(&policy)),
            Err(AuthzError::InsufficientPermissions)
        );
    }

    #[test]
    fn test_allow_bypasses_permissions() {
        let (user, read, _) = user_entity();
        let cache = Resource::new("cache");
        let ctx = AuthorizationContext::new(&user, read, &cache);
        let policy = policy_with(&ctx, ActionGateEffect::Allow);

        let powerless_admin = Role::new("admin", PermissionSet::empty());
        assert!(Authorizer::new()
            .decide(&ctx, &[powerless_admin], Some(&policy))
            .is_ok());
    }

    #[test]
    fn test_custom_strategy() {
        let (user, read, _) = user_entity();
        let cache = Resource::new("cache");
        let ctx = AuthorizationContext::new(&user, read, &cache);

        let permissive = Authorizer::from_fn(|_, _| Ok(()));
        assert!(permissive.decide(&ctx, &[], None).is_ok());

        let strict = Authorizer::from_fn(|required, permitted| {
            if required == permitted {
                Ok(())
            } else {
                Err(AuthzError::InsufficientPermissions)
            }
        });
        assert!(strict.decide(&ctx, &[admin()], None).is_err());
        assert!(strict
            .decide(&ctx, &[Role::new("reader", PermissionSet::READ)], None)
            .is_ok());
    }

    #[test]
    fn test_strategy_not_consulted_after_deny() {
        let (user, read, _) = user_entity();
        let cache = Resource::new("cache");
        let ctx = AuthorizationContext::new(&user, read, &cache);
        let policy = policy_with(&ctx, ActionGateEffect::Deny);

        let permissive = Authorizer::from_fn(|_, _| Ok(()));
        assert!(permissive.decide(&ctx, &[admin()], Some(&policy)).is_err());
    }
}
