use async_trait::async_trait;

use entiva_application::ReceiverDirectory;
use entiva_core::{AppResult, OrgId};
use entiva_domain::Receiver;

/// Receiver directory that accepts every id.
///
/// Used when no identity-directory integration is configured; receiver ids
/// are then taken at face value from the caller.
#[derive(Debug, Clone, Default)]
pub struct PermissiveReceiverDirectory;

#[async_trait]
impl ReceiverDirectory for PermissiveReceiverDirectory {
    async fn receiver_exists(&self, _org_id: OrgId, receiver: &Receiver) -> AppResult<bool> {
        tracing::debug!(
            receiver_id = receiver.receiver_id.as_str(),
            "no directory configured, accepting receiver id"
        );
        Ok(true)
    }
}
