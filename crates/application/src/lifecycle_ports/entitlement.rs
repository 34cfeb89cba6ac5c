use async_trait::async_trait;

use entiva_core::{AppResult, Etag, OrgId};
use entiva_domain::{Entitlement, HistoryRecord};

/// Input payload for creating an entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEntitlementInput {
    /// Entitlement name.
    pub name: String,
    /// Concrete resource id, or `None` for all resources.
    pub resource_id: Option<String>,
    /// Concrete action id, or `None` for all actions.
    pub action_id: Option<String>,
    /// Object scope reference, or `None` for the global scope.
    pub scope_ref: Option<String>,
}

/// Result of an entitlement-delete cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementDeleteOutcome {
    /// The deleted entitlement.
    pub entitlement: Entitlement,
    /// Roles the entitlement was detached from.
    pub detached_role_ids: Vec<String>,
    /// History records appended inside the cascade commit.
    pub history: Vec<HistoryRecord>,
}

/// Repository port for grantable entitlements.
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Persists a new entitlement.
    async fn insert(&self, org_id: OrgId, entitlement: Entitlement) -> AppResult<()>;

    /// Lists entitlements ordered by name.
    async fn list(&self, org_id: OrgId) -> AppResult<Vec<Entitlement>>;

    /// Finds an entitlement by id.
    async fn find(&self, org_id: OrgId, entitlement_id: &str) -> AppResult<Option<Entitlement>>;

    /// Deletes an entitlement under an etag guard, detaching it from every
    /// role that references it in the same commit.
    ///
    /// One `ENT_DELETED` history record is appended per (role, receiver)
    /// pair that loses the entitlement, attributed to `actor_id`.
    async fn delete(
        &self,
        org_id: OrgId,
        entitlement_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<EntitlementDeleteOutcome>;

    /// Returns whether any entitlement references the resource.
    async fn any_referencing_resource(&self, org_id: OrgId, resource_id: &str) -> AppResult<bool>;

    /// Returns whether any entitlement references the action.
    async fn any_referencing_action(&self, org_id: OrgId, action_id: &str) -> AppResult<bool>;
}
