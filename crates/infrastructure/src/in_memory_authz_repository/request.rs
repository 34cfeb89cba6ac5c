use async_trait::async_trait;

use entiva_application::{RequestQuery, RequestRepository};
use entiva_core::{AppError, AppResult, Etag, OrgId};
use entiva_domain::AccessRequest;

use super::{InMemoryAuthzRepository, paginate};

#[async_trait]
impl RequestRepository for InMemoryAuthzRepository {
    async fn insert(&self, org_id: OrgId, request: AccessRequest) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .requests
            .insert((org_id, request.request_id().to_owned()), request);
        Ok(())
    }

    async fn find(&self, org_id: OrgId, request_id: &str) -> AppResult<Option<AccessRequest>> {
        let state = self.state.read().await;
        Ok(state.requests.get(&(org_id, request_id.to_owned())).cloned())
    }

    async fn list(&self, org_id: OrgId, query: RequestQuery) -> AppResult<Vec<AccessRequest>> {
        let state = self.state.read().await;
        let mut requests: Vec<AccessRequest> = state
            .requests
            .iter()
            .filter(|((org, _), request)| {
                *org == org_id
                    && query.kind.is_none_or(|kind| request.kind() == kind)
                    && query.status.is_none_or(|status| request.status() == status)
                    && query
                        .receiver_id
                        .as_deref()
                        .is_none_or(|id| request.receiver().receiver_id.as_str() == id)
            })
            .map(|(_, request)| request.clone())
            .collect();
        requests.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(paginate(requests, query.limit, query.offset))
    }

    async fn transition(
        &self,
        org_id: OrgId,
        request: AccessRequest,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .requests
            .get(&(org_id, request.request_id().to_owned()))
            .ok_or_else(|| {
                AppError::NotFound(format!("request '{}' does not exist", request.request_id()))
            })?;
        if !stored.etag().matches(expected_etag) || stored.status().is_terminal() {
            return Err(AppError::Conflict(format!(
                "request '{}' was already decided",
                request.request_id()
            )));
        }

        state
            .requests
            .insert((org_id, request.request_id().to_owned()), request);
        Ok(())
    }
}
