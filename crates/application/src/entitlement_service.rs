use std::sync::Arc;

use entiva_core::{ActorIdentity, AppError, AppResult, Etag};
use entiva_domain::{ActionSelector, Entitlement, ResourceSelector, Scope, ScopeKind};

use crate::access::ensure_administrator;
use crate::{
    CatalogRepository, CreateEntitlementInput, EntitlementDeleteOutcome, EntitlementRepository,
};

/// Application service for grantable entitlements.
#[derive(Clone)]
pub struct EntitlementService {
    entitlements: Arc<dyn EntitlementRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl EntitlementService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        entitlements: Arc<dyn EntitlementRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            entitlements,
            catalog,
        }
    }

    /// Creates an entitlement after resolving its selectors against the
    /// catalog.
    ///
    /// An absent resource or action id means the wildcard selector. Concrete
    /// ids must resolve to live catalog entries, a concrete action must
    /// belong to the selected resource, and an object scope is only valid
    /// against a concrete resource whose scope kind admits object scoping.
    pub async fn create(
        &self,
        actor: &ActorIdentity,
        input: CreateEntitlementInput,
    ) -> AppResult<Entitlement> {
        ensure_administrator(actor)?;

        let resource = match input.resource_id {
            None => ResourceSelector::All,
            Some(resource_id) => {
                if self
                    .catalog
                    .find_resource(actor.org_id(), resource_id.as_str())
                    .await?
                    .is_none()
                {
                    return Err(AppError::InvalidReference(format!(
                        "resource '{resource_id}' does not exist"
                    )));
                }
                ResourceSelector::Id(resource_id)
            }
        };

        let action = match input.action_id {
            None => ActionSelector::All,
            Some(action_id) => {
                let action = self
                    .catalog
                    .find_action(actor.org_id(), action_id.as_str())
                    .await?
                    .ok_or_else(|| {
                        AppError::InvalidReference(format!("action '{action_id}' does not exist"))
                    })?;

                if let ResourceSelector::Id(resource_id) = &resource {
                    if action.resource_id() != resource_id {
                        return Err(AppError::InvalidReference(format!(
                            "action '{action_id}' does not belong to resource '{resource_id}'"
                        )));
                    }
                }

                ActionSelector::Id(action_id)
            }
        };

        let scope = Scope::from_ref(input.scope_ref)?;
        if !scope.is_global() {
            let ResourceSelector::Id(resource_id) = &resource else {
                return Err(AppError::Validation(
                    "an object scope requires a concrete resource".to_owned(),
                ));
            };

            let definition = self
                .catalog
                .find_resource(actor.org_id(), resource_id.as_str())
                .await?
                .ok_or_else(|| {
                    AppError::InvalidReference(format!("resource '{resource_id}' does not exist"))
                })?;
            if definition.scope_kind() != ScopeKind::Object {
                return Err(AppError::Validation(format!(
                    "resource '{resource_id}' does not admit object-scoped entitlements"
                )));
            }
        }

        let entitlement = Entitlement::new(input.name, resource, action, scope)?;
        self.entitlements
            .insert(actor.org_id(), entitlement.clone())
            .await?;

        tracing::info!(
            entitlement_id = entitlement.entitlement_id(),
            name = %entitlement.name(),
            wildcard = entitlement.is_wildcard(),
            "entitlement created"
        );
        Ok(entitlement)
    }

    /// Lists entitlements.
    pub async fn list(&self, actor: &ActorIdentity) -> AppResult<Vec<Entitlement>> {
        self.entitlements.list(actor.org_id()).await
    }

    /// Returns one entitlement.
    pub async fn get(&self, actor: &ActorIdentity, entitlement_id: &str) -> AppResult<Entitlement> {
        self.entitlements
            .find(actor.org_id(), entitlement_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("entitlement '{entitlement_id}' does not exist"))
            })
    }

    /// Deletes an entitlement, detaching it from every role that bundles it.
    ///
    /// The detachment and its history records are committed atomically with
    /// the delete by the storage adapter.
    pub async fn delete(
        &self,
        actor: &ActorIdentity,
        entitlement_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<EntitlementDeleteOutcome> {
        ensure_administrator(actor)?;

        let outcome = self
            .entitlements
            .delete(actor.org_id(), entitlement_id, expected_etag, actor.subject())
            .await?;

        tracing::info!(
            entitlement_id,
            detached_roles = outcome.detached_role_ids.len(),
            history_records = outcome.history.len(),
            "entitlement deleted"
        );
        Ok(outcome)
    }
}
