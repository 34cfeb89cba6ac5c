use async_trait::async_trait;

use entiva_application::CatalogRepository;
use entiva_core::{AppError, AppResult, Etag, OrgId};
use entiva_domain::{ActionDefinition, ResourceDefinition};

use super::InMemoryAuthzRepository;

#[async_trait]
impl CatalogRepository for InMemoryAuthzRepository {
    async fn insert_resource(&self, org_id: OrgId, resource: ResourceDefinition) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state
            .resources
            .iter()
            .any(|((org, _), existing)| *org == org_id && existing.name() == resource.name())
        {
            return Err(AppError::AlreadyExists(format!(
                "resource name '{}' is already taken",
                resource.name()
            )));
        }

        state
            .resources
            .insert((org_id, resource.resource_id().to_owned()), resource);
        Ok(())
    }

    async fn list_resources(&self, org_id: OrgId) -> AppResult<Vec<ResourceDefinition>> {
        let state = self.state.read().await;
        let mut resources: Vec<ResourceDefinition> = state
            .resources
            .iter()
            .filter(|((org, _), _)| *org == org_id)
            .map(|(_, resource)| resource.clone())
            .collect();
        resources.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(resources)
    }

    async fn find_resource(
        &self,
        org_id: OrgId,
        resource_id: &str,
    ) -> AppResult<Option<ResourceDefinition>> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .get(&(org_id, resource_id.to_owned()))
            .cloned())
    }

    async fn find_resource_by_name(
        &self,
        org_id: OrgId,
        name: &str,
    ) -> AppResult<Option<ResourceDefinition>> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .iter()
            .find(|((org, _), resource)| *org == org_id && resource.name().as_str() == name)
            .map(|(_, resource)| resource.clone()))
    }

    async fn delete_resource(
        &self,
        org_id: OrgId,
        resource_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let resource = state
            .resources
            .get(&(org_id, resource_id.to_owned()))
            .ok_or_else(|| {
                AppError::NotFound(format!("resource '{resource_id}' does not exist"))
            })?;
        if !resource.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "resource '{resource_id}' was modified concurrently"
            )));
        }

        state.resources.remove(&(org_id, resource_id.to_owned()));
        state
            .actions
            .retain(|(org, _), action| !(*org == org_id && action.resource_id() == resource_id));
        Ok(())
    }

    async fn insert_action(&self, org_id: OrgId, action: ActionDefinition) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.actions.iter().any(|((org, _), existing)| {
            *org == org_id
                && existing.resource_id() == action.resource_id()
                && existing.name() == action.name()
        }) {
            return Err(AppError::AlreadyExists(format!(
                "action name '{}' is already taken within resource '{}'",
                action.name(),
                action.resource_id()
            )));
        }

        state
            .actions
            .insert((org_id, action.action_id().to_owned()), action);
        Ok(())
    }

    async fn list_actions(
        &self,
        org_id: OrgId,
        resource_id: &str,
    ) -> AppResult<Vec<ActionDefinition>> {
        let state = self.state.read().await;
        let mut actions: Vec<ActionDefinition> = state
            .actions
            .iter()
            .filter(|((org, _), action)| *org == org_id && action.resource_id() == resource_id)
            .map(|(_, action)| action.clone())
            .collect();
        actions.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(actions)
    }

    async fn list_all_actions(&self, org_id: OrgId) -> AppResult<Vec<ActionDefinition>> {
        let state = self.state.read().await;
        let mut actions: Vec<ActionDefinition> = state
            .actions
            .iter()
            .filter(|((org, _), _)| *org == org_id)
            .map(|(_, action)| action.clone())
            .collect();
        actions.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(actions)
    }

    async fn find_action(
        &self,
        org_id: OrgId,
        action_id: &str,
    ) -> AppResult<Option<ActionDefinition>> {
        let state = self.state.read().await;
        Ok(state.actions.get(&(org_id, action_id.to_owned())).cloned())
    }

    async fn delete_action(
        &self,
        org_id: OrgId,
        action_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let action = state
            .actions
            .get(&(org_id, action_id.to_owned()))
            .ok_or_else(|| AppError::NotFound(format!("action '{action_id}' does not exist")))?;
        if !action.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "action '{action_id}' was modified concurrently"
            )));
        }

        state.actions.remove(&(org_id, action_id.to_owned()));
        Ok(())
    }
}
