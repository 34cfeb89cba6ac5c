use async_trait::async_trait;

use entiva_core::{AppResult, Etag, OrgId};
use entiva_domain::{AccessRequest, ReceiverType, RequestKind, RequestStatus};

/// Input payload for submitting a grant request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGrantRequestInput {
    /// Receiver kind the grant applies to.
    pub receiver_type: ReceiverType,
    /// Receiver identifier.
    pub receiver_id: String,
    /// `role` or `suite` target discriminator.
    pub target_type: String,
    /// Target role or suite id.
    pub target_id: String,
    /// Requestor comment.
    pub comment: Option<String>,
    /// Supporting attachment URL.
    pub attachment_url: Option<String>,
}

/// Input payload for submitting a revoke request (immediate effect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRevokeRequestInput {
    /// Receiver kind the revoke applies to.
    pub receiver_type: ReceiverType,
    /// Receiver identifier.
    pub receiver_id: String,
    /// `role` or `suite` target discriminator.
    pub target_type: String,
    /// Target role or suite id.
    pub target_id: String,
    /// Requestor comment.
    pub comment: Option<String>,
    /// Supporting attachment URL.
    pub attachment_url: Option<String>,
}

/// Query parameters for request listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestQuery {
    /// Optional direction filter.
    pub kind: Option<RequestKind>,
    /// Optional status filter.
    pub status: Option<RequestStatus>,
    /// Optional receiver filter.
    pub receiver_id: Option<String>,
    /// Maximum rows returned; `0` means the adapter default.
    pub limit: usize,
    /// Rows skipped for offset pagination.
    pub offset: usize,
}

/// Repository port for workflow requests.
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Persists a new request.
    async fn insert(&self, org_id: OrgId, request: AccessRequest) -> AppResult<()>;

    /// Finds a request by id.
    async fn find(&self, org_id: OrgId, request_id: &str) -> AppResult<Option<AccessRequest>>;

    /// Lists requests, newest first.
    async fn list(&self, org_id: OrgId, query: RequestQuery) -> AppResult<Vec<AccessRequest>>;

    /// Compare-and-swap transition: replaces the stored request with
    /// `request` only when the stored etag equals `expected_etag` and the
    /// stored status is still pending. A lost race fails with `Conflict`,
    /// making concurrent decisions exactly-once.
    async fn transition(
        &self,
        org_id: OrgId,
        request: AccessRequest,
        expected_etag: &Etag,
    ) -> AppResult<()>;
}
