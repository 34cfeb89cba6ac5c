use std::str::FromStr;

use serde::{Deserialize, Serialize};

use entiva_domain::{Assignment, AssignmentTarget, Receiver, ReceiverType};

use crate::error::ApiError;

/// Incoming payload for a direct grant.
#[derive(Debug, Deserialize)]
pub struct GrantAssignmentRequest {
    pub receiver_type: String,
    pub receiver_id: String,
    pub target_type: String,
    pub target_id: String,
}

impl GrantAssignmentRequest {
    pub fn into_parts(self) -> Result<(Receiver, AssignmentTarget), ApiError> {
        let receiver = Receiver::new(
            ReceiverType::from_str(self.receiver_type.as_str())?,
            self.receiver_id,
        )?;
        let target = AssignmentTarget::from_parts(self.target_type.as_str(), self.target_id)?;
        Ok((receiver, target))
    }
}

/// Incoming payload for a direct revoke.
#[derive(Debug, Deserialize)]
pub struct RevokeAssignmentRequest {
    pub receiver_type: String,
    pub receiver_id: String,
    pub target_type: String,
    pub target_id: String,
}

impl RevokeAssignmentRequest {
    pub fn into_parts(self) -> Result<(Receiver, AssignmentTarget), ApiError> {
        let receiver = Receiver::new(
            ReceiverType::from_str(self.receiver_type.as_str())?,
            self.receiver_id,
        )?;
        let target = AssignmentTarget::from_parts(self.target_type.as_str(), self.target_id)?;
        Ok((receiver, target))
    }
}

/// API representation of an assignment.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub target_type: String,
    pub target_id: String,
    pub receiver_type: String,
    pub receiver_id: String,
    pub granted_via: String,
    pub created_at: String,
}

impl From<Assignment> for AssignmentResponse {
    fn from(assignment: Assignment) -> Self {
        Self {
            target_type: assignment.target().target_type().to_owned(),
            target_id: assignment.target().target_id().to_owned(),
            receiver_type: assignment.receiver().receiver_type.as_str().to_owned(),
            receiver_id: assignment.receiver().receiver_id.clone(),
            granted_via: assignment.granted_via().as_str().to_owned(),
            created_at: assignment.created_at().to_rfc3339(),
        }
    }
}
