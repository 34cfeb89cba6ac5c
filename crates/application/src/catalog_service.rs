use std::sync::Arc;

use entiva_core::{ActorIdentity, AppError, AppResult, Etag};
use entiva_domain::{ActionDefinition, ResourceDefinition};

use crate::access::ensure_administrator;
use crate::{CatalogRepository, CreateActionInput, CreateResourceInput, EntitlementRepository};

/// Application service for the resource/action catalog.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
    entitlements: Arc<dyn EntitlementRepository>,
}

impl CatalogService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        entitlements: Arc<dyn EntitlementRepository>,
    ) -> Self {
        Self {
            catalog,
            entitlements,
        }
    }

    /// Registers a protectable resource in the catalog.
    pub async fn create_resource(
        &self,
        actor: &ActorIdentity,
        input: CreateResourceInput,
    ) -> AppResult<ResourceDefinition> {
        ensure_administrator(actor)?;

        if let Some(existing) = self
            .catalog
            .find_resource_by_name(actor.org_id(), input.name.trim())
            .await?
        {
            return Err(AppError::AlreadyExists(format!(
                "resource name '{}' is already taken by '{}'",
                existing.name(),
                existing.resource_id()
            )));
        }

        let resource = ResourceDefinition::new(
            input.name,
            input.resource_type,
            input.resource_ref,
            input.scope_kind,
        )?;
        self.catalog
            .insert_resource(actor.org_id(), resource.clone())
            .await?;

        tracing::info!(
            resource_id = resource.resource_id(),
            name = %resource.name(),
            "catalog resource created"
        );
        Ok(resource)
    }

    /// Lists catalog resources.
    pub async fn list_resources(&self, actor: &ActorIdentity) -> AppResult<Vec<ResourceDefinition>> {
        self.catalog.list_resources(actor.org_id()).await
    }

    /// Returns one catalog resource.
    pub async fn get_resource(
        &self,
        actor: &ActorIdentity,
        resource_id: &str,
    ) -> AppResult<ResourceDefinition> {
        self.catalog
            .find_resource(actor.org_id(), resource_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resource '{resource_id}' does not exist")))
    }

    /// Deletes a resource and its actions.
    ///
    /// Blocked while any live entitlement references the resource or one of
    /// its actions; the caller must delete or repoint those entitlements
    /// first.
    pub async fn delete_resource(
        &self,
        actor: &ActorIdentity,
        resource_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        ensure_administrator(actor)?;

        let resource = self.get_resource(actor, resource_id).await?;
        if self
            .entitlements
            .any_referencing_resource(actor.org_id(), resource_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "resource '{resource_id}' is referenced by a live entitlement"
            )));
        }

        for action in self.catalog.list_actions(actor.org_id(), resource_id).await? {
            if self
                .entitlements
                .any_referencing_action(actor.org_id(), action.action_id())
                .await?
            {
                return Err(AppError::Conflict(format!(
                    "action '{}' of resource '{resource_id}' is referenced by a live entitlement",
                    action.action_id()
                )));
            }
        }

        self.catalog
            .delete_resource(actor.org_id(), resource_id, expected_etag)
            .await?;

        tracing::info!(
            resource_id,
            name = %resource.name(),
            "catalog resource deleted"
        );
        Ok(())
    }

    /// Registers an action under an existing resource.
    pub async fn create_action(
        &self,
        actor: &ActorIdentity,
        input: CreateActionInput,
    ) -> AppResult<ActionDefinition> {
        ensure_administrator(actor)?;

        if self
            .catalog
            .find_resource(actor.org_id(), input.resource_id.as_str())
            .await?
            .is_none()
        {
            return Err(AppError::InvalidReference(format!(
                "resource '{}' does not exist",
                input.resource_id
            )));
        }

        let action = ActionDefinition::new(input.resource_id, input.name, input.description)?;
        self.catalog
            .insert_action(actor.org_id(), action.clone())
            .await?;

        tracing::info!(
            action_id = action.action_id(),
            resource_id = action.resource_id(),
            name = %action.name(),
            "catalog action created"
        );
        Ok(action)
    }

    /// Lists the actions of one resource.
    pub async fn list_actions(
        &self,
        actor: &ActorIdentity,
        resource_id: &str,
    ) -> AppResult<Vec<ActionDefinition>> {
        self.get_resource(actor, resource_id).await?;
        self.catalog.list_actions(actor.org_id(), resource_id).await
    }

    /// Deletes an action; blocked while a live entitlement references it.
    pub async fn delete_action(
        &self,
        actor: &ActorIdentity,
        action_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        ensure_administrator(actor)?;

        let action = self
            .catalog
            .find_action(actor.org_id(), action_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("action '{action_id}' does not exist")))?;

        if self
            .entitlements
            .any_referencing_action(actor.org_id(), action_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "action '{action_id}' is referenced by a live entitlement"
            )));
        }

        self.catalog
            .delete_action(actor.org_id(), action_id, expected_etag)
            .await?;

        tracing::info!(
            action_id,
            resource_id = action.resource_id(),
            "catalog action deleted"
        );
        Ok(())
    }
}
