use std::str::FromStr;

use serde::{Deserialize, Serialize};

use entiva_application::{
    CreateRoleInput, CreateRoleSuiteInput, RoleDeleteOutcome, SuiteDeleteOutcome, UpdateRoleInput,
    UpdateRoleSuiteInput,
};
use entiva_domain::{OwnerType, RequestPolicy, RoleDefinition, RoleSuiteDefinition};

use super::assignment::AssignmentResponse;
use super::entitlement::EntitlementResponse;
use super::history::HistoryRecordResponse;
use crate::error::ApiError;

/// Incoming payload for role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub owner_type: String,
    pub owner_ref: String,
    pub policy: RequestPolicy,
    #[serde(default)]
    pub entitlement_ids: Vec<String>,
}

impl CreateRoleRequest {
    pub fn into_input(self) -> Result<CreateRoleInput, ApiError> {
        let owner_type = OwnerType::from_str(self.owner_type.as_str()).map_err(ApiError::from)?;
        Ok(CreateRoleInput {
            name: self.name,
            owner_type,
            owner_ref: self.owner_ref,
            policy: self.policy,
            entitlement_ids: self.entitlement_ids,
        })
    }
}

/// Incoming payload for a role rename/policy update.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: String,
    pub policy: RequestPolicy,
}

impl From<UpdateRoleRequest> for UpdateRoleInput {
    fn from(payload: UpdateRoleRequest) -> Self {
        Self {
            name: payload.name,
            policy: payload.policy,
        }
    }
}

/// Incoming payload for role suite creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleSuiteRequest {
    pub name: String,
    pub owner_type: String,
    pub owner_ref: String,
    pub policy: RequestPolicy,
    #[serde(default)]
    pub role_ids: Vec<String>,
}

impl CreateRoleSuiteRequest {
    pub fn into_input(self) -> Result<CreateRoleSuiteInput, ApiError> {
        let owner_type = OwnerType::from_str(self.owner_type.as_str()).map_err(ApiError::from)?;
        Ok(CreateRoleSuiteInput {
            name: self.name,
            owner_type,
            owner_ref: self.owner_ref,
            policy: self.policy,
            role_ids: self.role_ids,
        })
    }
}

/// Incoming payload for a role suite update.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleSuiteRequest {
    pub name: String,
    pub policy: RequestPolicy,
    #[serde(default)]
    pub role_ids: Vec<String>,
}

impl From<UpdateRoleSuiteRequest> for UpdateRoleSuiteInput {
    fn from(payload: UpdateRoleSuiteRequest) -> Self {
        Self {
            name: payload.name,
            policy: payload.policy,
            role_ids: payload.role_ids,
        }
    }
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub owner_type: String,
    pub owner_ref: String,
    pub policy: RequestPolicy,
    pub entitlements: Vec<EntitlementResponse>,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<RoleDefinition> for RoleResponse {
    fn from(role: RoleDefinition) -> Self {
        Self {
            role_id: role.role_id().to_owned(),
            name: role.name().as_str().to_owned(),
            owner_type: role.owner_type().as_str().to_owned(),
            owner_ref: role.owner_ref().as_str().to_owned(),
            policy: role.policy(),
            entitlements: role.entitlements().iter().map(Into::into).collect(),
            etag: role.etag().as_str().to_owned(),
            created_at: role.created_at().to_rfc3339(),
            updated_at: role.updated_at().to_rfc3339(),
        }
    }
}

/// API representation of a role suite.
#[derive(Debug, Serialize)]
pub struct RoleSuiteResponse {
    pub role_suite_id: String,
    pub name: String,
    pub owner_type: String,
    pub owner_ref: String,
    pub policy: RequestPolicy,
    pub role_ids: Vec<String>,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<RoleSuiteDefinition> for RoleSuiteResponse {
    fn from(suite: RoleSuiteDefinition) -> Self {
        Self {
            role_suite_id: suite.role_suite_id().to_owned(),
            name: suite.name().as_str().to_owned(),
            owner_type: suite.owner_type().as_str().to_owned(),
            owner_ref: suite.owner_ref().as_str().to_owned(),
            policy: suite.policy(),
            role_ids: suite.role_ids().to_vec(),
            etag: suite.etag().as_str().to_owned(),
            created_at: suite.created_at().to_rfc3339(),
            updated_at: suite.updated_at().to_rfc3339(),
        }
    }
}

/// Cascade summary returned by a role delete.
#[derive(Debug, Serialize)]
pub struct RoleDeleteResponse {
    pub role: RoleResponse,
    pub detached_suite_ids: Vec<String>,
    pub removed_assignments: Vec<AssignmentResponse>,
    pub history: Vec<HistoryRecordResponse>,
}

impl From<RoleDeleteOutcome> for RoleDeleteResponse {
    fn from(outcome: RoleDeleteOutcome) -> Self {
        Self {
            role: outcome.role.into(),
            detached_suite_ids: outcome.detached_suite_ids,
            removed_assignments: outcome
                .removed_assignments
                .into_iter()
                .map(Into::into)
                .collect(),
            history: outcome.history.into_iter().map(Into::into).collect(),
        }
    }
}

/// Cascade summary returned by a role suite delete.
#[derive(Debug, Serialize)]
pub struct RoleSuiteDeleteResponse {
    pub role_suite: RoleSuiteResponse,
    pub removed_assignments: Vec<AssignmentResponse>,
    pub history: Vec<HistoryRecordResponse>,
}

impl From<SuiteDeleteOutcome> for RoleSuiteDeleteResponse {
    fn from(outcome: SuiteDeleteOutcome) -> Self {
        Self {
            role_suite: outcome.suite.into(),
            removed_assignments: outcome
                .removed_assignments
                .into_iter()
                .map(Into::into)
                .collect(),
            history: outcome.history.into_iter().map(Into::into).collect(),
        }
    }
}
