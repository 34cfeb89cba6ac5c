use async_trait::async_trait;

use entiva_application::{RoleDeleteOutcome, RoleRepository, SuiteDeleteOutcome};
use entiva_core::{AppError, AppResult, Etag, OrgId};
use entiva_domain::{
    AssignmentTarget, HistoryReason, HistoryRecord, HistoryRefs, RoleDefinition,
    RoleSuiteDefinition,
};

use super::InMemoryAuthzRepository;

#[async_trait]
impl RoleRepository for InMemoryAuthzRepository {
    async fn insert_role(&self, org_id: OrgId, role: RoleDefinition) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state
            .roles
            .iter()
            .any(|((org, _), existing)| *org == org_id && existing.name() == role.name())
        {
            return Err(AppError::AlreadyExists(format!(
                "role name '{}' is already taken",
                role.name()
            )));
        }

        state.roles.insert((org_id, role.role_id().to_owned()), role);
        Ok(())
    }

    async fn list_roles(&self, org_id: OrgId) -> AppResult<Vec<RoleDefinition>> {
        let state = self.state.read().await;
        let mut roles: Vec<RoleDefinition> = state
            .roles
            .iter()
            .filter(|((org, _), _)| *org == org_id)
            .map(|(_, role)| role.clone())
            .collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn find_role(&self, org_id: OrgId, role_id: &str) -> AppResult<Option<RoleDefinition>> {
        let state = self.state.read().await;
        Ok(state.roles.get(&(org_id, role_id.to_owned())).cloned())
    }

    async fn save_role(
        &self,
        org_id: OrgId,
        role: RoleDefinition,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .roles
            .get(&(org_id, role.role_id().to_owned()))
            .ok_or_else(|| {
                AppError::NotFound(format!("role '{}' does not exist", role.role_id()))
            })?;
        if !stored.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "role '{}' was modified concurrently",
                role.role_id()
            )));
        }

        state.roles.insert((org_id, role.role_id().to_owned()), role);
        Ok(())
    }

    async fn delete_role(
        &self,
        org_id: OrgId,
        role_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<RoleDeleteOutcome> {
        let mut state = self.state.write().await;
        let role = state
            .roles
            .get(&(org_id, role_id.to_owned()))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        if !role.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' was modified concurrently"
            )));
        }

        let containing_suite_ids: Vec<String> = state
            .suites
            .iter()
            .filter(|((org, _), suite)| {
                *org == org_id && suite.role_ids().iter().any(|member| member == role_id)
            })
            .map(|((_, suite_id), _)| suite_id.clone())
            .collect();

        let mut detached_suite_ids = Vec::new();
        for suite_id in &containing_suite_ids {
            if let Some(suite) = state.suites.get_mut(&(org_id, suite_id.clone())) {
                if suite.detach_role(role_id) {
                    detached_suite_ids.push(suite_id.clone());
                }
            }
        }

        let role_target = AssignmentTarget::Role(role_id.to_owned());
        let mut removed_assignments = Vec::new();
        state.assignments.retain(|(org, assignment)| {
            let removed = *org == org_id && assignment.target() == &role_target;
            if removed {
                removed_assignments.push(assignment.clone());
            }
            !removed
        });

        let mut history = Vec::new();
        for assignment in &removed_assignments {
            history.push(HistoryRecord::new(
                HistoryReason::RoleDeleted,
                assignment.receiver().clone(),
                HistoryRefs {
                    role_id: Some(role_id.to_owned()),
                    ..HistoryRefs::default()
                },
                Some(actor_id.to_owned()),
                None,
            ));
        }
        for suite_id in &detached_suite_ids {
            let suite_target = AssignmentTarget::Suite(suite_id.clone());
            for assignment in state.receivers_assigned_to(org_id, &suite_target) {
                history.push(HistoryRecord::new(
                    HistoryReason::RoleRemoved,
                    assignment.receiver().clone(),
                    HistoryRefs {
                        role_id: Some(role_id.to_owned()),
                        role_suite_id: Some(suite_id.clone()),
                        ..HistoryRefs::default()
                    },
                    Some(actor_id.to_owned()),
                    None,
                ));
            }
        }

        state.roles.remove(&(org_id, role_id.to_owned()));
        for record in &history {
            state.history.push((org_id, record.clone()));
        }

        Ok(RoleDeleteOutcome {
            role,
            detached_suite_ids,
            removed_assignments,
            history,
        })
    }

    async fn insert_suite(&self, org_id: OrgId, suite: RoleSuiteDefinition) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state
            .suites
            .iter()
            .any(|((org, _), existing)| *org == org_id && existing.name() == suite.name())
        {
            return Err(AppError::AlreadyExists(format!(
                "role suite name '{}' is already taken",
                suite.name()
            )));
        }

        state
            .suites
            .insert((org_id, suite.role_suite_id().to_owned()), suite);
        Ok(())
    }

    async fn list_suites(&self, org_id: OrgId) -> AppResult<Vec<RoleSuiteDefinition>> {
        let state = self.state.read().await;
        let mut suites: Vec<RoleSuiteDefinition> = state
            .suites
            .iter()
            .filter(|((org, _), _)| *org == org_id)
            .map(|(_, suite)| suite.clone())
            .collect();
        suites.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(suites)
    }

    async fn find_suite(
        &self,
        org_id: OrgId,
        role_suite_id: &str,
    ) -> AppResult<Option<RoleSuiteDefinition>> {
        let state = self.state.read().await;
        Ok(state.suites.get(&(org_id, role_suite_id.to_owned())).cloned())
    }

    async fn save_suite(
        &self,
        org_id: OrgId,
        suite: RoleSuiteDefinition,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .suites
            .get(&(org_id, suite.role_suite_id().to_owned()))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role suite '{}' does not exist",
                    suite.role_suite_id()
                ))
            })?;
        if !stored.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "role suite '{}' was modified concurrently",
                suite.role_suite_id()
            )));
        }

        state
            .suites
            .insert((org_id, suite.role_suite_id().to_owned()), suite);
        Ok(())
    }

    async fn delete_suite(
        &self,
        org_id: OrgId,
        role_suite_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<SuiteDeleteOutcome> {
        let mut state = self.state.write().await;
        let suite = state
            .suites
            .get(&(org_id, role_suite_id.to_owned()))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("role suite '{role_suite_id}' does not exist"))
            })?;
        if !suite.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "role suite '{role_suite_id}' was modified concurrently"
            )));
        }

        let suite_target = AssignmentTarget::Suite(role_suite_id.to_owned());
        let mut removed_assignments = Vec::new();
        state.assignments.retain(|(org, assignment)| {
            let removed = *org == org_id && assignment.target() == &suite_target;
            if removed {
                removed_assignments.push(assignment.clone());
            }
            !removed
        });

        let mut history = Vec::new();
        for assignment in &removed_assignments {
            history.push(HistoryRecord::new(
                HistoryReason::SuiteDeleted,
                assignment.receiver().clone(),
                HistoryRefs {
                    role_suite_id: Some(role_suite_id.to_owned()),
                    ..HistoryRefs::default()
                },
                Some(actor_id.to_owned()),
                None,
            ));
        }

        state.suites.remove(&(org_id, role_suite_id.to_owned()));
        for record in &history {
            state.history.push((org_id, record.clone()));
        }

        Ok(SuiteDeleteOutcome {
            suite,
            removed_assignments,
            history,
        })
    }

    async fn list_suites_containing_role(
        &self,
        org_id: OrgId,
        role_id: &str,
    ) -> AppResult<Vec<RoleSuiteDefinition>> {
        let state = self.state.read().await;
        Ok(state
            .suites
            .iter()
            .filter(|((org, _), suite)| {
                *org == org_id && suite.role_ids().iter().any(|member| member == role_id)
            })
            .map(|(_, suite)| suite.clone())
            .collect())
    }
}
