use std::str::FromStr;

use chrono::{DateTime, Utc};
use entiva_core::{AppError, AppResult, Etag, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assignment::{AssignmentTarget, Receiver};

/// Direction of a workflow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Requests that an assignment be created.
    Grant,
    /// Requests that an assignment be removed.
    Revoke,
}

impl RequestKind {
    /// Returns a stable storage value for the request kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }
}

impl FromStr for RequestKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "grant" => Ok(Self::Grant),
            "revoke" => Ok(Self::Revoke),
            _ => Err(AppError::Validation(format!(
                "unknown request kind '{value}'"
            ))),
        }
    }
}

/// Lifecycle state of a workflow request; every non-pending state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved; the assignment change was applied.
    Approved,
    /// Rejected; no permission change.
    Rejected,
    /// Withdrawn by the requestor or an administrator.
    Cancelled,
}

impl RequestStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether the status admits no further transition.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for RequestStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::Validation(format!(
                "unknown request status '{value}'"
            ))),
        }
    }
}

/// A grant or revoke request moving through the approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    request_id: String,
    kind: RequestKind,
    requestor_id: NonEmptyString,
    receiver: Receiver,
    target: AssignmentTarget,
    comment: Option<String>,
    attachment_url: Option<String>,
    status: RequestStatus,
    decided_by: Option<String>,
    etag: Etag,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccessRequest {
    /// Creates a new pending request.
    pub fn new(
        kind: RequestKind,
        requestor_id: impl Into<String>,
        receiver: Receiver,
        target: AssignmentTarget,
        comment: Option<String>,
        attachment_url: Option<String>,
    ) -> AppResult<Self> {
        let now = Utc::now();
        Ok(Self {
            request_id: Uuid::new_v4().to_string(),
            kind,
            requestor_id: NonEmptyString::new(requestor_id)?,
            receiver,
            target,
            comment: comment.filter(|value| !value.trim().is_empty()),
            attachment_url: attachment_url.filter(|value| !value.trim().is_empty()),
            status: RequestStatus::Pending,
            decided_by: None,
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a request from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        request_id: impl Into<String>,
        kind: RequestKind,
        requestor_id: impl Into<String>,
        receiver: Receiver,
        target: AssignmentTarget,
        comment: Option<String>,
        attachment_url: Option<String>,
        status: RequestStatus,
        decided_by: Option<String>,
        etag: Etag,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            request_id: NonEmptyString::new(request_id)?.into(),
            kind,
            requestor_id: NonEmptyString::new(requestor_id)?,
            receiver,
            target,
            comment,
            attachment_url,
            status,
            decided_by,
            etag,
            created_at,
            updated_at,
        })
    }

    /// Returns the stable request identifier.
    #[must_use]
    pub fn request_id(&self) -> &str {
        self.request_id.as_str()
    }

    /// Returns the request direction.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns the subject that submitted the request.
    #[must_use]
    pub fn requestor_id(&self) -> &NonEmptyString {
        &self.requestor_id
    }

    /// Returns the receiver the change applies to.
    #[must_use]
    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Returns the role or suite the change applies to.
    #[must_use]
    pub fn target(&self) -> &AssignmentTarget {
        &self.target
    }

    /// Returns the requestor's comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the supporting attachment URL, if any.
    #[must_use]
    pub fn attachment_url(&self) -> Option<&str> {
        self.attachment_url.as_deref()
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Returns the subject that decided the request, once terminal.
    #[must_use]
    pub fn decided_by(&self) -> Option<&str> {
        self.decided_by.as_deref()
    }

    fn ensure_pending(&self) -> AppResult<()> {
        if self.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "request '{}' is already {}",
                self.request_id,
                self.status.as_str()
            )));
        }

        Ok(())
    }

    /// Transitions `pending -> approved`, attributing the approver.
    pub fn approve(&mut self, approver_id: impl Into<String>) -> AppResult<()> {
        self.ensure_pending()?;
        self.status = RequestStatus::Approved;
        self.decided_by = Some(NonEmptyString::new(approver_id)?.into());
        self.touch();
        Ok(())
    }

    /// Transitions `pending -> rejected`, attributing the approver.
    pub fn reject(&mut self, approver_id: impl Into<String>) -> AppResult<()> {
        self.ensure_pending()?;
        self.status = RequestStatus::Rejected;
        self.decided_by = Some(NonEmptyString::new(approver_id)?.into());
        self.touch();
        Ok(())
    }

    /// Transitions `pending -> cancelled`.
    ///
    /// Only the original requestor or an administrator may cancel.
    pub fn cancel(&mut self, actor_id: &str, actor_is_administrator: bool) -> AppResult<()> {
        self.ensure_pending()?;

        if self.requestor_id.as_str() != actor_id && !actor_is_administrator {
            return Err(AppError::Validation(format!(
                "request '{}' can only be cancelled by its requestor or an administrator",
                self.request_id
            )));
        }

        self.status = RequestStatus::Cancelled;
        self.decided_by = Some(actor_id.to_owned());
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.etag = Etag::new();
        self.updated_at = Utc::now();
    }

    /// Returns the concurrency token of the current state.
    #[must_use]
    pub fn etag(&self) -> &Etag {
        &self.etag
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use crate::assignment::{AssignmentTarget, Receiver};

    use super::{AccessRequest, RequestKind, RequestStatus};

    fn pending_request() -> AccessRequest {
        AccessRequest::new(
            RequestKind::Grant,
            "alice",
            Receiver::user("bob").unwrap_or_else(|_| unreachable!()),
            AssignmentTarget::Role("role-1".to_owned()),
            None,
            None,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn approve_is_terminal() {
        let mut request = pending_request();
        assert!(request.approve("carol").is_ok());
        assert_eq!(request.status(), RequestStatus::Approved);
        assert!(request.reject("carol").is_err());
        assert!(request.cancel("alice", false).is_err());
    }

    #[test]
    fn cancel_requires_requestor_or_administrator() {
        let mut request = pending_request();
        assert!(request.cancel("mallory", false).is_err());
        assert!(request.cancel("mallory", true).is_ok());
        assert_eq!(request.status(), RequestStatus::Cancelled);
    }

    #[test]
    fn transitions_rotate_the_etag() {
        let mut request = pending_request();
        let etag_before = request.etag().clone();
        assert!(request.approve("carol").is_ok());
        assert!(!request.etag().matches(&etag_before));
    }

    #[test]
    fn blank_comment_is_normalized_to_none() {
        let request = AccessRequest::new(
            RequestKind::Grant,
            "alice",
            Receiver::user("bob").unwrap_or_else(|_| unreachable!()),
            AssignmentTarget::Role("role-1".to_owned()),
            Some("   ".to_owned()),
            None,
        )
        .unwrap_or_else(|_| unreachable!());

        assert!(request.comment().is_none());
    }
}
