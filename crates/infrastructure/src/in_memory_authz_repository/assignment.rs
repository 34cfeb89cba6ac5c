use async_trait::async_trait;

use entiva_application::AssignmentRepository;
use entiva_core::{AppResult, OrgId};
use entiva_domain::{Assignment, AssignmentTarget, Receiver};

use super::InMemoryAuthzRepository;

#[async_trait]
impl AssignmentRepository for InMemoryAuthzRepository {
    async fn insert(&self, org_id: OrgId, assignment: Assignment) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let duplicate = state.assignments.iter().any(|(org, existing)| {
            *org == org_id
                && existing.target() == assignment.target()
                && existing.receiver() == assignment.receiver()
        });
        if duplicate {
            return Ok(false);
        }

        state.assignments.push((org_id, assignment));
        Ok(true)
    }

    async fn remove(
        &self,
        org_id: OrgId,
        target: &AssignmentTarget,
        receiver: &Receiver,
    ) -> AppResult<Option<Assignment>> {
        let mut state = self.state.write().await;
        let position = state.assignments.iter().position(|(org, assignment)| {
            *org == org_id && assignment.target() == target && assignment.receiver() == receiver
        });
        Ok(position.map(|index| state.assignments.remove(index).1))
    }

    async fn list(&self, org_id: OrgId) -> AppResult<Vec<Assignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|(org, _)| *org == org_id)
            .map(|(_, assignment)| assignment.clone())
            .collect())
    }

    async fn list_for_receivers(
        &self,
        org_id: OrgId,
        receivers: &[Receiver],
    ) -> AppResult<Vec<Assignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|(org, assignment)| *org == org_id && receivers.contains(assignment.receiver()))
            .map(|(_, assignment)| assignment.clone())
            .collect())
    }

    async fn list_for_target(
        &self,
        org_id: OrgId,
        target: &AssignmentTarget,
    ) -> AppResult<Vec<Assignment>> {
        let state = self.state.read().await;
        Ok(state.receivers_assigned_to(org_id, target))
    }
}
