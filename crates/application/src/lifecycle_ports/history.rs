use async_trait::async_trait;

use chrono::{DateTime, Utc};
use entiva_core::{AppResult, OrgId};
use entiva_domain::HistoryRecord;

/// Query parameters for permission-history listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Optional receiver filter.
    pub receiver_id: Option<String>,
    /// Optional entitlement filter.
    pub entitlement_id: Option<String>,
    /// Optional role filter.
    pub role_id: Option<String>,
    /// Optional suite filter.
    pub role_suite_id: Option<String>,
    /// Optional grant-request filter.
    pub grant_request_id: Option<String>,
    /// Optional revoke-request filter.
    pub revoke_request_id: Option<String>,
    /// Lower bound on the append timestamp.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound on the append timestamp.
    pub to: Option<DateTime<Utc>>,
    /// Maximum rows returned; `0` means the adapter default.
    pub limit: usize,
    /// Rows skipped for offset pagination.
    pub offset: usize,
}

/// Repository port for the append-only permission history.
///
/// The trait deliberately offers no update or delete operation; the audit
/// trail's immutability is a hard invariant.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Appends one record.
    async fn append(&self, org_id: OrgId, record: HistoryRecord) -> AppResult<()>;

    /// Lists records matching the query, newest first.
    async fn list(&self, org_id: OrgId, query: HistoryQuery) -> AppResult<Vec<HistoryRecord>>;
}
