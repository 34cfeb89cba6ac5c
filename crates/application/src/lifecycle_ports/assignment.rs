use async_trait::async_trait;

use entiva_core::{AppResult, OrgId};
use entiva_domain::{Assignment, AssignmentTarget, Receiver};

/// Repository port for role/suite assignments.
///
/// Assignments carry no etag of their own: every write flows through the
/// request workflow's compare-and-swap or a direct administrative call, so
/// the guarding token belongs to the operation, not the binding.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persists an assignment; returns `false` when the identical binding
    /// already exists (idempotent approval).
    async fn insert(&self, org_id: OrgId, assignment: Assignment) -> AppResult<bool>;

    /// Removes an assignment, returning it, or `None` when absent.
    async fn remove(
        &self,
        org_id: OrgId,
        target: &AssignmentTarget,
        receiver: &Receiver,
    ) -> AppResult<Option<Assignment>>;

    /// Lists every assignment in the organization.
    async fn list(&self, org_id: OrgId) -> AppResult<Vec<Assignment>>;

    /// Lists assignments held by any of the given receivers.
    async fn list_for_receivers(
        &self,
        org_id: OrgId,
        receivers: &[Receiver],
    ) -> AppResult<Vec<Assignment>>;

    /// Lists assignments targeting one role or suite.
    async fn list_for_target(
        &self,
        org_id: OrgId,
        target: &AssignmentTarget,
    ) -> AppResult<Vec<Assignment>>;
}
