use std::str::FromStr;

use serde::{Deserialize, Serialize};

use entiva_application::{CreateGrantRequestInput, CreateRevokeRequestInput, RequestQuery};
use entiva_domain::{AccessRequest, ReceiverType, RequestKind, RequestStatus};

use crate::error::ApiError;

/// Incoming payload for a grant request submission.
#[derive(Debug, Deserialize)]
pub struct SubmitGrantRequest {
    pub receiver_type: String,
    pub receiver_id: String,
    pub target_type: String,
    pub target_id: String,
    pub comment: Option<String>,
    pub attachment_url: Option<String>,
}

impl SubmitGrantRequest {
    pub fn into_input(self) -> Result<CreateGrantRequestInput, ApiError> {
        Ok(CreateGrantRequestInput {
            receiver_type: ReceiverType::from_str(self.receiver_type.as_str())?,
            receiver_id: self.receiver_id,
            target_type: self.target_type,
            target_id: self.target_id,
            comment: self.comment,
            attachment_url: self.attachment_url,
        })
    }
}

/// Incoming payload for a revoke request submission.
#[derive(Debug, Deserialize)]
pub struct SubmitRevokeRequest {
    pub receiver_type: String,
    pub receiver_id: String,
    pub target_type: String,
    pub target_id: String,
    pub comment: Option<String>,
    pub attachment_url: Option<String>,
}

impl SubmitRevokeRequest {
    pub fn into_input(self) -> Result<CreateRevokeRequestInput, ApiError> {
        Ok(CreateRevokeRequestInput {
            receiver_type: ReceiverType::from_str(self.receiver_type.as_str())?,
            receiver_id: self.receiver_id,
            target_type: self.target_type,
            target_id: self.target_id,
            comment: self.comment,
            attachment_url: self.attachment_url,
        })
    }
}

/// Query parameters accepted by the request listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsParams {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub receiver_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListRequestsParams {
    pub fn into_query(self) -> Result<RequestQuery, ApiError> {
        let kind = self
            .kind
            .as_deref()
            .map(RequestKind::from_str)
            .transpose()?;
        let status = self
            .status
            .as_deref()
            .map(RequestStatus::from_str)
            .transpose()?;

        Ok(RequestQuery {
            kind,
            status,
            receiver_id: self.receiver_id,
            limit: self.limit.unwrap_or(0),
            offset: self.offset.unwrap_or(0),
        })
    }
}

/// API representation of a grant/revoke request.
#[derive(Debug, Serialize)]
pub struct AccessRequestResponse {
    pub request_id: String,
    pub kind: String,
    pub requestor_id: String,
    pub receiver_type: String,
    pub receiver_id: String,
    pub target_type: String,
    pub target_id: String,
    pub comment: Option<String>,
    pub attachment_url: Option<String>,
    pub status: String,
    pub decided_by: Option<String>,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AccessRequest> for AccessRequestResponse {
    fn from(request: AccessRequest) -> Self {
        Self {
            request_id: request.request_id().to_owned(),
            kind: request.kind().as_str().to_owned(),
            requestor_id: request.requestor_id().as_str().to_owned(),
            receiver_type: request.receiver().receiver_type.as_str().to_owned(),
            receiver_id: request.receiver().receiver_id.clone(),
            target_type: request.target().target_type().to_owned(),
            target_id: request.target().target_id().to_owned(),
            comment: request.comment().map(ToOwned::to_owned),
            attachment_url: request.attachment_url().map(ToOwned::to_owned),
            status: request.status().as_str().to_owned(),
            decided_by: request.decided_by().map(ToOwned::to_owned),
            etag: request.etag().as_str().to_owned(),
            created_at: request.created_at().to_rfc3339(),
            updated_at: request.updated_at().to_rfc3339(),
        }
    }
}
