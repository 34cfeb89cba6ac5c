use async_trait::async_trait;

use entiva_application::{EntitlementDeleteOutcome, EntitlementRepository};
use entiva_core::{AppError, AppResult, Etag, OrgId};
use entiva_domain::{
    ActionSelector, AssignmentTarget, Entitlement, HistoryReason, HistoryRecord, HistoryRefs,
    ResourceSelector,
};

use super::InMemoryAuthzRepository;

#[async_trait]
impl EntitlementRepository for InMemoryAuthzRepository {
    async fn insert(&self, org_id: OrgId, entitlement: Entitlement) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .entitlements
            .insert((org_id, entitlement.entitlement_id().to_owned()), entitlement);
        Ok(())
    }

    async fn list(&self, org_id: OrgId) -> AppResult<Vec<Entitlement>> {
        let state = self.state.read().await;
        let mut entitlements: Vec<Entitlement> = state
            .entitlements
            .iter()
            .filter(|((org, _), _)| *org == org_id)
            .map(|(_, entitlement)| entitlement.clone())
            .collect();
        entitlements.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(entitlements)
    }

    async fn find(&self, org_id: OrgId, entitlement_id: &str) -> AppResult<Option<Entitlement>> {
        let state = self.state.read().await;
        Ok(state
            .entitlements
            .get(&(org_id, entitlement_id.to_owned()))
            .cloned())
    }

    async fn delete(
        &self,
        org_id: OrgId,
        entitlement_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<EntitlementDeleteOutcome> {
        let mut state = self.state.write().await;
        let entitlement = state
            .entitlements
            .get(&(org_id, entitlement_id.to_owned()))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("entitlement '{entitlement_id}' does not exist"))
            })?;
        if !entitlement.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "entitlement '{entitlement_id}' was modified concurrently"
            )));
        }

        let referencing_role_ids: Vec<String> = state
            .roles
            .iter()
            .filter(|((org, _), role)| {
                *org == org_id
                    && role
                        .entitlements()
                        .iter()
                        .any(|member| member.entitlement_id() == entitlement_id)
            })
            .map(|((_, role_id), _)| role_id.clone())
            .collect();

        let mut detached_role_ids = Vec::new();
        let mut history = Vec::new();
        for role_id in &referencing_role_ids {
            let removed = match state.roles.get_mut(&(org_id, role_id.clone())) {
                Some(role) => role.detach_entitlement(entitlement_id),
                None => continue,
            };
            if removed.is_empty() {
                continue;
            }
            detached_role_ids.push(role_id.clone());

            let target = AssignmentTarget::Role(role_id.clone());
            for assignment in state.receivers_assigned_to(org_id, &target) {
                history.push(HistoryRecord::new(
                    HistoryReason::EntitlementDeleted,
                    assignment.receiver().clone(),
                    HistoryRefs {
                        entitlement_id: Some(entitlement_id.to_owned()),
                        role_id: Some(role_id.clone()),
                        ..HistoryRefs::default()
                    },
                    Some(actor_id.to_owned()),
                    None,
                ));
            }
        }

        state.entitlements.remove(&(org_id, entitlement_id.to_owned()));
        for record in &history {
            state.history.push((org_id, record.clone()));
        }

        Ok(EntitlementDeleteOutcome {
            entitlement,
            detached_role_ids,
            history,
        })
    }

    async fn any_referencing_resource(&self, org_id: OrgId, resource_id: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        // Wildcard selectors track the catalog; only a literal id pins the
        // resource and blocks its deletion.
        Ok(state.entitlements.iter().any(|((org, _), entitlement)| {
            *org == org_id
                && matches!(
                    entitlement.resource(),
                    ResourceSelector::Id(selected) if selected == resource_id
                )
        }))
    }

    async fn any_referencing_action(&self, org_id: OrgId, action_id: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.entitlements.iter().any(|((org, _), entitlement)| {
            *org == org_id
                && matches!(
                    entitlement.action(),
                    ActionSelector::Id(selected) if selected == action_id
                )
        }))
    }
}
