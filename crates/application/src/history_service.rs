use std::sync::Arc;

use entiva_core::{ActorIdentity, AppResult};
use entiva_domain::HistoryRecord;

use crate::{HistoryQuery, HistoryRepository};

/// Read-side service over the append-only permission history.
///
/// Records are written by the lifecycle services and cascades; this service
/// only lists them. Non-administrators are pinned to their own receiver id,
/// whatever the query asked for.
#[derive(Clone)]
pub struct HistoryService {
    history: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(history: Arc<dyn HistoryRepository>) -> Self {
        Self { history }
    }

    /// Lists history records matching the query, newest first.
    pub async fn list(
        &self,
        actor: &ActorIdentity,
        mut query: HistoryQuery,
    ) -> AppResult<Vec<HistoryRecord>> {
        if !actor.is_administrator() {
            query.receiver_id = Some(actor.subject().to_owned());
        }

        self.history.list(actor.org_id(), query).await
    }
}
