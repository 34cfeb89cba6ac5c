use serde::{Deserialize, Serialize};

use entiva_application::{CreateEntitlementInput, EntitlementDeleteOutcome};
use entiva_domain::{ActionSelector, Entitlement, ResourceSelector};

use super::history::HistoryRecordResponse;

/// Incoming payload for entitlement creation.
///
/// A missing `resource_id` or `action_id` means the wildcard selector.
#[derive(Debug, Deserialize)]
pub struct CreateEntitlementRequest {
    pub name: String,
    pub resource_id: Option<String>,
    pub action_id: Option<String>,
    pub scope_ref: Option<String>,
}

impl From<CreateEntitlementRequest> for CreateEntitlementInput {
    fn from(payload: CreateEntitlementRequest) -> Self {
        Self {
            name: payload.name,
            resource_id: payload.resource_id,
            action_id: payload.action_id,
            scope_ref: payload.scope_ref,
        }
    }
}

/// API representation of an entitlement.
#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    pub entitlement_id: String,
    pub name: String,
    /// `None` when the entitlement covers every resource.
    pub resource_id: Option<String>,
    /// `None` when the entitlement covers every action.
    pub action_id: Option<String>,
    /// `None` for the global scope.
    pub scope_ref: Option<String>,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Entitlement> for EntitlementResponse {
    fn from(entitlement: &Entitlement) -> Self {
        let resource_id = match entitlement.resource() {
            ResourceSelector::All => None,
            ResourceSelector::Id(resource_id) => Some(resource_id.clone()),
        };
        let action_id = match entitlement.action() {
            ActionSelector::All => None,
            ActionSelector::Id(action_id) => Some(action_id.clone()),
        };

        Self {
            entitlement_id: entitlement.entitlement_id().to_owned(),
            name: entitlement.name().as_str().to_owned(),
            resource_id,
            action_id,
            scope_ref: entitlement.scope().as_ref_value().map(ToOwned::to_owned),
            etag: entitlement.etag().as_str().to_owned(),
            created_at: entitlement.created_at().to_rfc3339(),
            updated_at: entitlement.updated_at().to_rfc3339(),
        }
    }
}

impl From<Entitlement> for EntitlementResponse {
    fn from(entitlement: Entitlement) -> Self {
        Self::from(&entitlement)
    }
}

/// Cascade summary returned by an entitlement delete.
#[derive(Debug, Serialize)]
pub struct EntitlementDeleteResponse {
    pub entitlement: EntitlementResponse,
    pub detached_role_ids: Vec<String>,
    pub history: Vec<HistoryRecordResponse>,
}

impl From<EntitlementDeleteOutcome> for EntitlementDeleteResponse {
    fn from(outcome: EntitlementDeleteOutcome) -> Self {
        Self {
            entitlement: outcome.entitlement.into(),
            detached_role_ids: outcome.detached_role_ids,
            history: outcome.history.into_iter().map(Into::into).collect(),
        }
    }
}
