use async_trait::async_trait;

use entiva_application::{HistoryQuery, HistoryRepository};
use entiva_core::{AppResult, OrgId};
use entiva_domain::HistoryRecord;

use super::{InMemoryAuthzRepository, paginate};

fn ref_matches(filter: Option<&str>, stored: Option<&str>) -> bool {
    filter.is_none_or(|wanted| stored == Some(wanted))
}

#[async_trait]
impl HistoryRepository for InMemoryAuthzRepository {
    async fn append(&self, org_id: OrgId, record: HistoryRecord) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.history.push((org_id, record));
        Ok(())
    }

    async fn list(&self, org_id: OrgId, query: HistoryQuery) -> AppResult<Vec<HistoryRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<HistoryRecord> = state
            .history
            .iter()
            .filter(|(org, record)| {
                *org == org_id
                    && query
                        .receiver_id
                        .as_deref()
                        .is_none_or(|id| record.receiver().receiver_id.as_str() == id)
                    && ref_matches(
                        query.entitlement_id.as_deref(),
                        record.refs().entitlement_id.as_deref(),
                    )
                    && ref_matches(query.role_id.as_deref(), record.refs().role_id.as_deref())
                    && ref_matches(
                        query.role_suite_id.as_deref(),
                        record.refs().role_suite_id.as_deref(),
                    )
                    && ref_matches(
                        query.grant_request_id.as_deref(),
                        record.refs().grant_request_id.as_deref(),
                    )
                    && ref_matches(
                        query.revoke_request_id.as_deref(),
                        record.refs().revoke_request_id.as_deref(),
                    )
                    && query.from.is_none_or(|from| record.created_at() >= from)
                    && query.to.is_none_or(|to| record.created_at() <= to)
            })
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(paginate(records, query.limit, query.offset))
    }
}
