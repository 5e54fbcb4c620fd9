//! # Schema
//!
//! One validated scope (typically one service): its roles, entities,
//! resources and action-gate policy.
//!
//! A schema can only be obtained through [`SchemaBuilder::build`] or by
//! normalizing a configuration document, both of which validate it. Once
//! built it exposes no mutation.

use crate::authorizer::Authorizer;
use crate::context::AuthorizationContext;
use crate::entity::{Action, Entity};
use crate::error::{AuthzError, AuthzResult, ConfigResult};
use crate::normalize;
use crate::policy::{ActionGatePolicy, ActionGateRule, RuleProvider};
use crate::raw::RawSchema;
use crate::resource::Resource;
use crate::role::{find_role, roles_by_names, Role};
use crate::validate;

/// A validated role/entity/resource/policy graph for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    id: String,
    name: String,
    roles: Vec<Role>,
    default_roles: Vec<Role>,
    entities: Vec<Entity>,
    resources: Vec<Resource>,
    policy: ActionGatePolicy,
}

impl Schema {
    /// Start building a schema with the given id.
    pub fn builder(id: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(id)
    }

    /// Normalize and validate a standalone schema document.
    ///
    /// Its roles are used as declared; there are no global roles to merge.
    pub fn from_raw(raw: &RawSchema) -> ConfigResult<Self> {
        normalize::normalize_schema(raw, &[])
    }

    /// Schema id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name (may be empty).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective roles of this schema.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Roles every new user of this schema receives.
    pub fn default_roles(&self) -> &[Role] {
        &self.default_roles
    }

    /// Declared entities.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Declared resources.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// The schema's action-gate policy.
    pub fn policy(&self) -> &ActionGatePolicy {
        &self.policy
    }

    /// Find an entity by name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    /// Find a resource by name.
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name() == name)
    }

    /// Resolve a role by name.
    ///
    /// # Arguments
    ///
    /// * `name` - Role name, as declared or inherited from the host
    ///
    /// # Returns
    ///
    /// A copy of the schema's effective role.
    ///
    /// # Errors
    ///
    /// [`AuthzError::RoleNotFound`] if the schema has no such role.
    pub fn parse_role(&self, name: &str) -> AuthzResult<Role> {
        find_role(&self.roles, name)
            .cloned()
            .ok_or_else(|| AuthzError::RoleNotFound {
                scope: self.scope(),
                role: name.to_string(),
            })
    }

    /// Resolve several role names; fails on the first unknown one.
    pub fn parse_roles<S: AsRef<str>>(&self, names: &[S]) -> AuthzResult<Vec<Role>> {
        roles_by_names(&self.roles, names, &self.scope())
    }

    /// Build an authorization context from names.
    ///
    /// The action is not checked here; [`Authorizer::decide`] reports an
    /// undeclared action as [`AuthzError::EntityLacksAction`].
    pub fn context(
        &self,
        entity: &str,
        action: &str,
        resource: &str,
    ) -> AuthzResult<AuthorizationContext<'_>> {
        let entity_ref = self.entity(entity).ok_or_else(|| AuthzError::UnknownEntity {
            schema: self.id.clone(),
            entity: entity.to_string(),
        })?;
        let resource_ref = self
            .resource(resource)
            .ok_or_else(|| AuthzError::UnknownResource {
                schema: self.id.clone(),
                resource: resource.to_string(),
            })?;

        Ok(AuthorizationContext::new(
            entity_ref,
            Action::new(action),
            resource_ref,
        ))
    }

    /// Authorize a request expressed by names, against this schema's policy.
    ///
    /// # Arguments
    ///
    /// * `authorizer` - Decision engine to apply
    /// * `entity` - Entity name
    /// * `action` - Action name
    /// * `resource` - Resource name
    /// * `role_names` - Names of the caller's roles in this schema
    ///
    /// # Returns
    ///
    /// `Ok(())` if the caller may perform the action. Unknown names fail
    /// with a lookup error before any decision is made.
    ///
    /// # Example
    ///
    /// ```
    /// use sentinel_rbac::*;
    ///
    /// let mut user = Entity::new("user");
    /// user.new_action("read", PermissionSet::READ).unwrap();
    ///
    /// let schema = Schema::builder("users")
    ///     .role(Role::new("reader", PermissionSet::READ))
    ///     .role(Role::new("guest", PermissionSet::empty()))
    ///     .entity(user)
    ///     .resource(Resource::new("cache"))
    ///     .build()
    ///     .unwrap();
    ///
    /// let authorizer = Authorizer::new();
    /// assert!(schema.authorize(&authorizer, "user", "read", "cache", &["reader"]).is_ok());
    /// assert!(schema.authorize(&authorizer, "user", "read", "cache", &["guest"]).is_err());
    /// ```
    pub fn authorize<S: AsRef<str>>(
        &self,
        authorizer: &Authorizer,
        entity: &str,
        action: &str,
        resource: &str,
        role_names: &[S],
    ) -> AuthzResult<()> {
        let ctx = self.context(entity, action, resource)?;
        let roles = self.parse_roles(role_names)?;

        authorizer.decide(&ctx, &roles, Some(self))
    }

    pub(crate) fn scope(&self) -> String {
        format!("schema \"{}\"", self.id)
    }
}

impl RuleProvider for Schema {
    fn get_rule(&self, ctx: &AuthorizationContext<'_>) -> Option<&ActionGateRule> {
        self.policy.get_rule(ctx)
    }
}

/// Builder for [`Schema`]; `build` validates.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    id: String,
    name: String,
    roles: Vec<Role>,
    default_roles: Vec<Role>,
    entities: Vec<Entity>,
    resources: Vec<Resource>,
    policy: ActionGatePolicy,
}

impl SchemaBuilder {
    /// Start a schema with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set a human-readable name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a role.
    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    /// Add several roles.
    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.extend(roles);
        self
    }

    /// Add a default role. It must also be one of the schema roles.
    pub fn default_role(mut self, role: Role) -> Self {
        self.default_roles.push(role);
        self
    }

    /// Add several default roles.
    pub fn default_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.default_roles.extend(roles);
        self
    }

    /// Add an entity.
    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add several entities.
    pub fn entities(mut self, entities: impl IntoIterator<Item = Entity>) -> Self {
        self.entities.extend(entities);
        self
    }

    /// Add a resource.
    pub fn resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Add several resources.
    pub fn resources(mut self, resources: impl IntoIterator<Item = Resource>) -> Self {
        self.resources.extend(resources);
        self
    }

    /// Set the action-gate policy.
    pub fn policy(mut self, policy: ActionGatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate and build the schema.
    pub fn build(self) -> ConfigResult<Schema> {
        let schema = Schema {
            id: self.id,
            name: self.name,
            roles: self.roles,
            default_roles: self.default_roles,
            entities: self.entities,
            resources: self.resources,
            policy: self.policy,
        };

        validate::validate_schema(&schema)?;

        Ok(schema)
    }
}
