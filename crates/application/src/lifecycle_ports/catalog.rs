use async_trait::async_trait;

use entiva_core::{AppResult, Etag, OrgId};
use entiva_domain::{ActionDefinition, ResourceDefinition, ScopeKind};

/// Input payload for creating a catalog resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResourceInput {
    /// Resource name, unique per organization.
    pub name: String,
    /// Resource type discriminator.
    pub resource_type: String,
    /// External reference of the protected object, if any.
    pub resource_ref: Option<String>,
    /// How entitlements against the resource may be scoped.
    pub scope_kind: ScopeKind,
}

/// Input payload for creating an action under a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateActionInput {
    /// Parent resource identifier.
    pub resource_id: String,
    /// Action name, unique within the resource.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
}

/// Repository port for the resource/action catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persists a new resource; duplicate name fails with `AlreadyExists`.
    async fn insert_resource(&self, org_id: OrgId, resource: ResourceDefinition) -> AppResult<()>;

    /// Lists resources ordered by name.
    async fn list_resources(&self, org_id: OrgId) -> AppResult<Vec<ResourceDefinition>>;

    /// Finds a resource by id.
    async fn find_resource(
        &self,
        org_id: OrgId,
        resource_id: &str,
    ) -> AppResult<Option<ResourceDefinition>>;

    /// Finds a resource by unique name.
    async fn find_resource_by_name(
        &self,
        org_id: OrgId,
        name: &str,
    ) -> AppResult<Option<ResourceDefinition>>;

    /// Deletes a resource and its actions under an etag guard.
    ///
    /// The adapter removes the resource's actions in the same commit; the
    /// caller has already established that no live entitlement references
    /// the resource or any of its actions.
    async fn delete_resource(
        &self,
        org_id: OrgId,
        resource_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<()>;

    /// Persists a new action; duplicate name within the resource fails with
    /// `AlreadyExists`.
    async fn insert_action(&self, org_id: OrgId, action: ActionDefinition) -> AppResult<()>;

    /// Lists actions of one resource ordered by name.
    async fn list_actions(
        &self,
        org_id: OrgId,
        resource_id: &str,
    ) -> AppResult<Vec<ActionDefinition>>;

    /// Lists every action in the organization; used for wildcard expansion.
    async fn list_all_actions(&self, org_id: OrgId) -> AppResult<Vec<ActionDefinition>>;

    /// Finds an action by id.
    async fn find_action(
        &self,
        org_id: OrgId,
        action_id: &str,
    ) -> AppResult<Option<ActionDefinition>>;

    /// Deletes an action under an etag guard.
    async fn delete_action(
        &self,
        org_id: OrgId,
        action_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<()>;
}
