use std::str::FromStr;

use serde::{Deserialize, Serialize};

use entiva_application::{CreateActionInput, CreateResourceInput};
use entiva_domain::{ActionDefinition, ResourceDefinition, ScopeKind};

use crate::error::ApiError;

/// Incoming payload for catalog resource creation.
#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub name: String,
    pub resource_type: String,
    pub resource_ref: Option<String>,
    pub scope_kind: String,
}

impl CreateResourceRequest {
    pub fn into_input(self) -> Result<CreateResourceInput, ApiError> {
        let scope_kind = ScopeKind::from_str(self.scope_kind.as_str()).map_err(ApiError::from)?;
        Ok(CreateResourceInput {
            name: self.name,
            resource_type: self.resource_type,
            resource_ref: self.resource_ref,
            scope_kind,
        })
    }
}

/// Incoming payload for catalog action creation.
#[derive(Debug, Deserialize)]
pub struct CreateActionRequest {
    pub resource_id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<CreateActionRequest> for CreateActionInput {
    fn from(payload: CreateActionRequest) -> Self {
        Self {
            resource_id: payload.resource_id,
            name: payload.name,
            description: payload.description,
        }
    }
}

/// API representation of a catalog resource.
#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub resource_id: String,
    pub name: String,
    pub resource_type: String,
    pub resource_ref: Option<String>,
    pub scope_kind: String,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ResourceDefinition> for ResourceResponse {
    fn from(resource: ResourceDefinition) -> Self {
        Self {
            resource_id: resource.resource_id().to_owned(),
            name: resource.name().as_str().to_owned(),
            resource_type: resource.resource_type().as_str().to_owned(),
            resource_ref: resource.resource_ref().map(ToOwned::to_owned),
            scope_kind: resource.scope_kind().as_str().to_owned(),
            etag: resource.etag().as_str().to_owned(),
            created_at: resource.created_at().to_rfc3339(),
            updated_at: resource.updated_at().to_rfc3339(),
        }
    }
}

/// API representation of a catalog action.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub action_id: String,
    pub resource_id: String,
    pub name: String,
    pub description: Option<String>,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ActionDefinition> for ActionResponse {
    fn from(action: ActionDefinition) -> Self {
        Self {
            action_id: action.action_id().to_owned(),
            resource_id: action.resource_id().to_owned(),
            name: action.name().as_str().to_owned(),
            description: action.description().map(ToOwned::to_owned),
            etag: action.etag().as_str().to_owned(),
            created_at: action.created_at().to_rfc3339(),
            updated_at: action.updated_at().to_rfc3339(),
        }
    }
}
