use async_trait::async_trait;

use entiva_core::{AppResult, OrgId};
use entiva_domain::Receiver;

/// External identity-directory port for receiver existence checks.
///
/// The directory lives in another module and may fail independently; callers
/// degrade gracefully on a failed read (keep the raw id, log, proceed)
/// rather than aborting the operation.
#[async_trait]
pub trait ReceiverDirectory: Send + Sync {
    /// Returns whether the receiver exists in the directory.
    async fn receiver_exists(&self, org_id: OrgId, receiver: &Receiver) -> AppResult<bool>;
}
