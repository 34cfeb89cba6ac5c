use std::sync::Arc;

use entiva_core::{ActorIdentity, AppError, AppResult, Etag};
use entiva_domain::{
    AssignmentTarget, Entitlement, HistoryReason, HistoryRecord, HistoryRefs, RoleDefinition,
    RoleSuiteDefinition,
};

use crate::access::ensure_administrator;
use crate::{
    AssignmentRepository, CreateRoleInput, CreateRoleSuiteInput, EntitlementRepository,
    HistoryRepository, RoleDeleteOutcome, RoleRepository, SuiteDeleteOutcome, UpdateRoleInput,
    UpdateRoleSuiteInput,
};

/// Application service for roles and role suites.
#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
    entitlements: Arc<dyn EntitlementRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    history: Arc<dyn HistoryRepository>,
}

impl RoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        entitlements: Arc<dyn EntitlementRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            roles,
            entitlements,
            assignments,
            history,
        }
    }

    async fn resolve_entitlements(
        &self,
        actor: &ActorIdentity,
        entitlement_ids: &[String],
    ) -> AppResult<Vec<Entitlement>> {
        let mut resolved = Vec::with_capacity(entitlement_ids.len());
        for entitlement_id in entitlement_ids {
            let entitlement = self
                .entitlements
                .find(actor.org_id(), entitlement_id)
                .await?
                .ok_or_else(|| {
                    AppError::InvalidReference(format!(
                        "entitlement '{entitlement_id}' does not exist"
                    ))
                })?;
            resolved.push(entitlement);
        }

        Ok(resolved)
    }

    async fn ensure_roles_exist(&self, actor: &ActorIdentity, role_ids: &[String]) -> AppResult<()> {
        for role_id in role_ids {
            if self.roles.find_role(actor.org_id(), role_id).await?.is_none() {
                return Err(AppError::InvalidReference(format!(
                    "role '{role_id}' does not exist"
                )));
            }
        }

        Ok(())
    }

    /// Appends one membership-edit history record per receiver currently
    /// assigned the role. No receivers means no permission changed, so
    /// nothing is recorded.
    async fn record_membership_edit(
        &self,
        actor: &ActorIdentity,
        reason: HistoryReason,
        role_id: &str,
        entitlement_id: &str,
    ) -> AppResult<()> {
        let target = AssignmentTarget::Role(role_id.to_owned());
        for assignment in self
            .assignments
            .list_for_target(actor.org_id(), &target)
            .await?
        {
            self.history
                .append(
                    actor.org_id(),
                    HistoryRecord::new(
                        reason,
                        assignment.receiver().clone(),
                        HistoryRefs {
                            entitlement_id: Some(entitlement_id.to_owned()),
                            role_id: Some(role_id.to_owned()),
                            ..HistoryRefs::default()
                        },
                        Some(actor.subject().to_owned()),
                        None,
                    ),
                )
                .await?;
        }

        Ok(())
    }

    /// Creates a role bundling the given entitlements.
    pub async fn create_role(
        &self,
        actor: &ActorIdentity,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        ensure_administrator(actor)?;

        let entitlements = self.resolve_entitlements(actor, &input.entitlement_ids).await?;
        let role = RoleDefinition::new(
            input.name,
            input.owner_type,
            input.owner_ref,
            input.policy,
            entitlements,
        )?;
        self.roles.insert_role(actor.org_id(), role.clone()).await?;

        tracing::info!(role_id = role.role_id(), name = %role.name(), "role created");
        Ok(role)
    }

    /// Lists roles.
    pub async fn list_roles(&self, actor: &ActorIdentity) -> AppResult<Vec<RoleDefinition>> {
        self.roles.list_roles(actor.org_id()).await
    }

    /// Returns one role.
    pub async fn get_role(&self, actor: &ActorIdentity, role_id: &str) -> AppResult<RoleDefinition> {
        self.roles
            .find_role(actor.org_id(), role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    /// Renames a role and updates its policy flags.
    pub async fn update_role(
        &self,
        actor: &ActorIdentity,
        role_id: &str,
        input: UpdateRoleInput,
        expected_etag: &Etag,
    ) -> AppResult<RoleDefinition> {
        ensure_administrator(actor)?;

        let mut role = self.get_role(actor, role_id).await?;
        role.update(input.name, input.policy)?;
        self.roles
            .save_role(actor.org_id(), role.clone(), expected_etag)
            .await?;

        Ok(role)
    }

    /// Adds an entitlement to a role's membership.
    ///
    /// Receivers assigned the role gain the permission immediately, so one
    /// `ENT_ADDED` history record is appended per assigned receiver.
    pub async fn add_entitlement(
        &self,
        actor: &ActorIdentity,
        role_id: &str,
        entitlement_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<RoleDefinition> {
        ensure_administrator(actor)?;

        let entitlement = self
            .entitlements
            .find(actor.org_id(), entitlement_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidReference(format!("entitlement '{entitlement_id}' does not exist"))
            })?;

        let mut role = self.get_role(actor, role_id).await?;
        role.add_entitlement(entitlement)?;
        self.roles
            .save_role(actor.org_id(), role.clone(), expected_etag)
            .await?;

        self.record_membership_edit(actor, HistoryReason::EntitlementAdded, role_id, entitlement_id)
            .await?;

        tracing::info!(role_id, entitlement_id, "entitlement added to role");
        Ok(role)
    }

    /// Removes an entitlement from a role's membership.
    ///
    /// Appends one `ENT_REMOVED` history record per assigned receiver.
    pub async fn remove_entitlement(
        &self,
        actor: &ActorIdentity,
        role_id: &str,
        entitlement_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<RoleDefinition> {
        ensure_administrator(actor)?;

        let mut role = self.get_role(actor, role_id).await?;
        let key = role
            .entitlements()
            .iter()
            .find(|member| member.entitlement_id() == entitlement_id)
            .map(Entitlement::key)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role '{role_id}' does not contain entitlement '{entitlement_id}'"
                ))
            })?;
        role.remove_entitlement(&key)?;
        self.roles
            .save_role(actor.org_id(), role.clone(), expected_etag)
            .await?;

        self.record_membership_edit(
            actor,
            HistoryReason::EntitlementRemoved,
            role_id,
            entitlement_id,
        )
        .await?;

        tracing::info!(role_id, entitlement_id, "entitlement removed from role");
        Ok(role)
    }

    /// Deletes a role, cascading through suites and assignments.
    pub async fn delete_role(
        &self,
        actor: &ActorIdentity,
        role_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<RoleDeleteOutcome> {
        ensure_administrator(actor)?;

        let outcome = self
            .roles
            .delete_role(actor.org_id(), role_id, expected_etag, actor.subject())
            .await?;

        tracing::info!(
            role_id,
            detached_suites = outcome.detached_suite_ids.len(),
            removed_assignments = outcome.removed_assignments.len(),
            "role deleted"
        );
        Ok(outcome)
    }

    /// Creates a role suite bundling the given roles.
    pub async fn create_suite(
        &self,
        actor: &ActorIdentity,
        input: CreateRoleSuiteInput,
    ) -> AppResult<RoleSuiteDefinition> {
        ensure_administrator(actor)?;

        self.ensure_roles_exist(actor, &input.role_ids).await?;
        let suite = RoleSuiteDefinition::new(
            input.name,
            input.owner_type,
            input.owner_ref,
            input.policy,
            input.role_ids,
        )?;
        self.roles.insert_suite(actor.org_id(), suite.clone()).await?;

        tracing::info!(
            role_suite_id = suite.role_suite_id(),
            name = %suite.name(),
            "role suite created"
        );
        Ok(suite)
    }

    /// Lists role suites.
    pub async fn list_suites(&self, actor: &ActorIdentity) -> AppResult<Vec<RoleSuiteDefinition>> {
        self.roles.list_suites(actor.org_id()).await
    }

    /// Returns one role suite.
    pub async fn get_suite(
        &self,
        actor: &ActorIdentity,
        role_suite_id: &str,
    ) -> AppResult<RoleSuiteDefinition> {
        self.roles
            .find_suite(actor.org_id(), role_suite_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("role suite '{role_suite_id}' does not exist"))
            })
    }

    /// Renames a suite, updates its policy flags, and replaces its members.
    pub async fn update_suite(
        &self,
        actor: &ActorIdentity,
        role_suite_id: &str,
        input: UpdateRoleSuiteInput,
        expected_etag: &Etag,
    ) -> AppResult<RoleSuiteDefinition> {
        ensure_administrator(actor)?;

        self.ensure_roles_exist(actor, &input.role_ids).await?;
        let mut suite = self.get_suite(actor, role_suite_id).await?;
        suite.update(input.name, input.policy)?;
        suite.replace_roles(input.role_ids)?;
        self.roles
            .save_suite(actor.org_id(), suite.clone(), expected_etag)
            .await?;

        Ok(suite)
    }

    /// Deletes a suite, removing its assignments.
    pub async fn delete_suite(
        &self,
        actor: &ActorIdentity,
        role_suite_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<SuiteDeleteOutcome> {
        ensure_administrator(actor)?;

        let outcome = self
            .roles
            .delete_suite(actor.org_id(), role_suite_id, expected_etag, actor.subject())
            .await?;

        tracing::info!(
            role_suite_id,
            removed_assignments = outcome.removed_assignments.len(),
            "role suite deleted"
        );
        Ok(outcome)
    }
}
