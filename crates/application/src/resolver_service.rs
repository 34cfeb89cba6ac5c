use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use entiva_core::{ActorIdentity, AppError, AppResult, Principal};
use entiva_domain::{
    ActionSelector, AssignmentTarget, EffectivePermission, Receiver, ResourceSelector, Scope,
};

use crate::{AssignmentRepository, CatalogRepository, RoleRepository};

/// One permission question: does the principal hold this action on this
/// resource, optionally within an object scope?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCheck {
    /// Catalog resource id.
    pub resource_id: String,
    /// Catalog action id.
    pub action_id: String,
    /// Object scope reference; `None` asks about the global scope.
    pub scope_ref: Option<String>,
}

/// Read-side service computing effective permissions from assignments.
///
/// Resolution never mutates anything: it walks assignments to roles, roles to
/// entitlements, and expands wildcard selectors against the current catalog.
#[derive(Clone)]
pub struct PermissionResolver {
    assignments: Arc<dyn AssignmentRepository>,
    roles: Arc<dyn RoleRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl PermissionResolver {
    /// Creates a new resolver from required dependencies.
    #[must_use]
    pub fn new(
        assignments: Arc<dyn AssignmentRepository>,
        roles: Arc<dyn RoleRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            assignments,
            roles,
            catalog,
        }
    }

    fn ensure_visible(actor: &ActorIdentity, principal: &Principal) -> AppResult<()> {
        if actor.is_administrator() || actor.subject() == principal.user_id {
            return Ok(());
        }

        Err(AppError::Unauthorized(format!(
            "subject '{}' may not inspect permissions of '{}'",
            actor.subject(),
            principal.user_id
        )))
    }

    fn receivers_of(principal: &Principal) -> AppResult<Vec<Receiver>> {
        let mut receivers = vec![Receiver::user(principal.user_id.as_str())?];
        for group_id in &principal.group_ids {
            receivers.push(Receiver::group(group_id.as_str())?);
        }

        Ok(receivers)
    }

    /// Collects the distinct role ids the principal holds, directly or
    /// through suites. Dangling suite or role references are skipped; the
    /// delete cascades keep them rare but a concurrent delete can race a
    /// resolution.
    async fn held_role_ids(
        &self,
        actor: &ActorIdentity,
        principal: &Principal,
    ) -> AppResult<BTreeSet<String>> {
        let receivers = Self::receivers_of(principal)?;
        let assignments = self
            .assignments
            .list_for_receivers(actor.org_id(), &receivers)
            .await?;

        let mut role_ids = BTreeSet::new();
        for assignment in assignments {
            match assignment.target() {
                AssignmentTarget::Role(role_id) => {
                    role_ids.insert(role_id.clone());
                }
                AssignmentTarget::Suite(role_suite_id) => {
                    if let Some(suite) = self
                        .roles
                        .find_suite(actor.org_id(), role_suite_id)
                        .await?
                    {
                        role_ids.extend(suite.role_ids().iter().cloned());
                    }
                }
            }
        }

        Ok(role_ids)
    }

    /// Resolves the principal's full effective permission set.
    ///
    /// Wildcard selectors are expanded against the catalog at resolution
    /// time, so a wildcard grant covers resources and actions registered
    /// after the grant was made. The result is deduplicated and ordered.
    pub async fn resolve(
        &self,
        actor: &ActorIdentity,
        principal: &Principal,
    ) -> AppResult<Vec<EffectivePermission>> {
        Self::ensure_visible(actor, principal)?;

        let role_ids = self.held_role_ids(actor, principal).await?;
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut actions_by_resource: HashMap<String, Vec<String>> = HashMap::new();
        for action in self.catalog.list_all_actions(actor.org_id()).await? {
            actions_by_resource
                .entry(action.resource_id().to_owned())
                .or_default()
                .push(action.action_id().to_owned());
        }

        let mut permissions = BTreeSet::new();
        for role_id in &role_ids {
            let Some(role) = self.roles.find_role(actor.org_id(), role_id).await? else {
                continue;
            };

            for entitlement in role.entitlements() {
                let scope = entitlement.scope().clone();
                match (entitlement.resource(), entitlement.action()) {
                    (ResourceSelector::Id(resource_id), ActionSelector::Id(action_id)) => {
                        permissions.insert(EffectivePermission::new(
                            resource_id.clone(),
                            action_id.clone(),
                            scope,
                        ));
                    }
                    (ResourceSelector::Id(resource_id), ActionSelector::All) => {
                        for action_id in
                            actions_by_resource.get(resource_id).into_iter().flatten()
                        {
                            permissions.insert(EffectivePermission::new(
                                resource_id.clone(),
                                action_id.clone(),
                                scope.clone(),
                            ));
                        }
                    }
                    (ResourceSelector::All, _) => {
                        for (resource_id, action_ids) in &actions_by_resource {
                            for action_id in action_ids {
                                permissions.insert(EffectivePermission::new(
                                    resource_id.clone(),
                                    action_id.clone(),
                                    scope.clone(),
                                ));
                            }
                        }
                    }
                }
            }
        }

        Ok(permissions.into_iter().collect())
    }

    /// Answers one permission question against the unexpanded grants.
    ///
    /// Selector coverage is checked directly, so wildcard grants answer
    /// without a catalog walk. Scope matching is literal: a concrete grant
    /// covers exactly its own scope, and only a wildcard grant with no scope
    /// covers every requested scope.
    pub async fn has_permission(
        &self,
        actor: &ActorIdentity,
        principal: &Principal,
        check: &PermissionCheck,
    ) -> AppResult<bool> {
        Self::ensure_visible(actor, principal)?;

        let role_ids = self.held_role_ids(actor, principal).await?;
        for role_id in &role_ids {
            let Some(role) = self.roles.find_role(actor.org_id(), role_id).await? else {
                continue;
            };

            for entitlement in role.entitlements() {
                if !entitlement.resource().covers(check.resource_id.as_str())
                    || !entitlement.action().covers(check.action_id.as_str())
                {
                    continue;
                }

                let scope_matches = match entitlement.scope() {
                    // Only a wildcard grant with no scope covers every scope;
                    // a concrete grant answers exactly its own scope.
                    Scope::Global if entitlement.is_wildcard() => true,
                    Scope::Global => check.scope_ref.is_none(),
                    Scope::Ref(scope_ref) => check.scope_ref.as_deref() == Some(scope_ref.as_str()),
                };
                if scope_matches {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use entiva_core::{ActorIdentity, AppError, AppResult, Etag, OrgId, Principal};
    use entiva_domain::{
        ActionDefinition, ActionSelector, Assignment, AssignmentTarget, EffectivePermission,
        Entitlement, GrantedVia, OwnerType, Receiver, RequestPolicy, ResourceDefinition,
        ResourceSelector, RoleDefinition, RoleSuiteDefinition, Scope, ScopeKind,
    };

    use crate::{RoleDeleteOutcome, SuiteDeleteOutcome};

    use super::{
        AssignmentRepository, CatalogRepository, PermissionCheck, PermissionResolver,
        RoleRepository,
    };

    #[derive(Default)]
    struct FakeCatalogRepository {
        resources: Mutex<HashMap<String, ResourceDefinition>>,
        actions: Mutex<HashMap<String, ActionDefinition>>,
    }

    #[async_trait]
    impl CatalogRepository for FakeCatalogRepository {
        async fn insert_resource(
            &self,
            _org_id: OrgId,
            resource: ResourceDefinition,
        ) -> AppResult<()> {
            self.resources
                .lock()
                .await
                .insert(resource.resource_id().to_owned(), resource);
            Ok(())
        }

        async fn list_resources(&self, _org_id: OrgId) -> AppResult<Vec<ResourceDefinition>> {
            Ok(self.resources.lock().await.values().cloned().collect())
        }

        async fn find_resource(
            &self,
            _org_id: OrgId,
            resource_id: &str,
        ) -> AppResult<Option<ResourceDefinition>> {
            Ok(self.resources.lock().await.get(resource_id).cloned())
        }

        async fn find_resource_by_name(
            &self,
            _org_id: OrgId,
            name: &str,
        ) -> AppResult<Option<ResourceDefinition>> {
            Ok(self
                .resources
                .lock()
                .await
                .values()
                .find(|resource| resource.name().as_str() == name)
                .cloned())
        }

        async fn delete_resource(
            &self,
            _org_id: OrgId,
            resource_id: &str,
            _expected_etag: &Etag,
        ) -> AppResult<()> {
            self.resources.lock().await.remove(resource_id);
            Ok(())
        }

        async fn insert_action(&self, _org_id: OrgId, action: ActionDefinition) -> AppResult<()> {
            self.actions
                .lock()
                .await
                .insert(action.action_id().to_owned(), action);
            Ok(())
        }

        async fn list_actions(
            &self,
            _org_id: OrgId,
            resource_id: &str,
        ) -> AppResult<Vec<ActionDefinition>> {
            Ok(self
                .actions
                .lock()
                .await
                .values()
                .filter(|action| action.resource_id() == resource_id)
                .cloned()
                .collect())
        }

        async fn list_all_actions(&self, _org_id: OrgId) -> AppResult<Vec<ActionDefinition>> {
            Ok(self.actions.lock().await.values().cloned().collect())
        }

        async fn find_action(
            &self,
            _org_id: OrgId,
            action_id: &str,
        ) -> AppResult<Option<ActionDefinition>> {
            Ok(self.actions.lock().await.get(action_id).cloned())
        }

        async fn delete_action(
            &self,
            _org_id: OrgId,
            action_id: &str,
            _expected_etag: &Etag,
        ) -> AppResult<()> {
            self.actions.lock().await.remove(action_id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRoleRepository {
        roles: Mutex<HashMap<String, RoleDefinition>>,
        suites: Mutex<HashMap<String, RoleSuiteDefinition>>,
    }

    #[async_trait]
    impl RoleRepository for FakeRoleRepository {
        async fn insert_role(&self, _org_id: OrgId, role: RoleDefinition) -> AppResult<()> {
            self.roles
                .lock()
                .await
                .insert(role.role_id().to_owned(), role);
            Ok(())
        }

        async fn list_roles(&self, _org_id: OrgId) -> AppResult<Vec<RoleDefinition>> {
            Ok(self.roles.lock().await.values().cloned().collect())
        }

        async fn find_role(
            &self,
            _org_id: OrgId,
            role_id: &str,
        ) -> AppResult<Option<RoleDefinition>> {
            Ok(self.roles.lock().await.get(role_id).cloned())
        }

        async fn save_role(
            &self,
            _org_id: OrgId,
            role: RoleDefinition,
            _expected_etag: &Etag,
        ) -> AppResult<()> {
            self.roles
                .lock()
                .await
                .insert(role.role_id().to_owned(), role);
            Ok(())
        }

        async fn delete_role(
            &self,
            _org_id: OrgId,
            role_id: &str,
            _expected_etag: &Etag,
            _actor_id: &str,
        ) -> AppResult<RoleDeleteOutcome> {
            Err(AppError::NotFound(format!("role '{role_id}' does not exist")))
        }

        async fn insert_suite(&self, _org_id: OrgId, suite: RoleSuiteDefinition) -> AppResult<()> {
            self.suites
                .lock()
                .await
                .insert(suite.role_suite_id().to_owned(), suite);
            Ok(())
        }

        async fn list_suites(&self, _org_id: OrgId) -> AppResult<Vec<RoleSuiteDefinition>> {
            Ok(self.suites.lock().await.values().cloned().collect())
        }

        async fn find_suite(
            &self,
            _org_id: OrgId,
            role_suite_id: &str,
        ) -> AppResult<Option<RoleSuiteDefinition>> {
            Ok(self.suites.lock().await.get(role_suite_id).cloned())
        }

        async fn save_suite(
            &self,
            _org_id: OrgId,
            suite: RoleSuiteDefinition,
            _expected_etag: &Etag,
        ) -> AppResult<()> {
            self.suites
                .lock()
                .await
                .insert(suite.role_suite_id().to_owned(), suite);
            Ok(())
        }

        async fn delete_suite(
            &self,
            _org_id: OrgId,
            role_suite_id: &str,
            _expected_etag: &Etag,
            _actor_id: &str,
        ) -> AppResult<SuiteDeleteOutcome> {
            Err(AppError::NotFound(format!(
                "role suite '{role_suite_id}' does not exist"
            )))
        }

        async fn list_suites_containing_role(
            &self,
            _org_id: OrgId,
            _role_id: &str,
        ) -> AppResult<Vec<RoleSuiteDefinition>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct FakeAssignmentRepository {
        assignments: Mutex<Vec<Assignment>>,
    }

    #[async_trait]
    impl AssignmentRepository for FakeAssignmentRepository {
        async fn insert(&self, _org_id: OrgId, assignment: Assignment) -> AppResult<bool> {
            self.assignments.lock().await.push(assignment);
            Ok(true)
        }

        async fn remove(
            &self,
            _org_id: OrgId,
            target: &AssignmentTarget,
            receiver: &Receiver,
        ) -> AppResult<Option<Assignment>> {
            let mut assignments = self.assignments.lock().await;
            let position = assignments
                .iter()
                .position(|binding| binding.target() == target && binding.receiver() == receiver);
            Ok(position.map(|index| assignments.remove(index)))
        }

        async fn list(&self, _org_id: OrgId) -> AppResult<Vec<Assignment>> {
            Ok(self.assignments.lock().await.clone())
        }

        async fn list_for_receivers(
            &self,
            _org_id: OrgId,
            receivers: &[Receiver],
        ) -> AppResult<Vec<Assignment>> {
            Ok(self
                .assignments
                .lock()
                .await
                .iter()
                .filter(|binding| receivers.contains(binding.receiver()))
                .cloned()
                .collect())
        }

        async fn list_for_target(
            &self,
            _org_id: OrgId,
            target: &AssignmentTarget,
        ) -> AppResult<Vec<Assignment>> {
            Ok(self
                .assignments
                .lock()
                .await
                .iter()
                .filter(|binding| binding.target() == target)
                .cloned()
                .collect())
        }
    }

    struct Harness {
        resolver: PermissionResolver,
        catalog: Arc<FakeCatalogRepository>,
        roles: Arc<FakeRoleRepository>,
        assignments: Arc<FakeAssignmentRepository>,
        org_id: OrgId,
    }

    fn harness() -> Harness {
        let catalog = Arc::new(FakeCatalogRepository::default());
        let roles = Arc::new(FakeRoleRepository::default());
        let assignments = Arc::new(FakeAssignmentRepository::default());
        let resolver =
            PermissionResolver::new(assignments.clone(), roles.clone(), catalog.clone());
        Harness {
            resolver,
            catalog,
            roles,
            assignments,
            org_id: OrgId::new(),
        }
    }

    fn admin(org_id: OrgId) -> ActorIdentity {
        ActorIdentity::new("root", "Root", org_id, Vec::new(), true)
    }

    fn open_policy() -> RequestPolicy {
        RequestPolicy {
            is_requestable: true,
            is_required_attachment: false,
            is_required_comment: false,
        }
    }

    async fn seed_catalog(harness: &Harness) -> (ResourceDefinition, Vec<ActionDefinition>) {
        let invoice = ResourceDefinition::new("invoice", "module", None, ScopeKind::Object)
            .unwrap_or_else(|_| unreachable!());
        harness
            .catalog
            .insert_resource(harness.org_id, invoice.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        let mut actions = Vec::new();
        for name in ["read", "approve"] {
            let action = ActionDefinition::new(invoice.resource_id(), name, None)
                .unwrap_or_else(|_| unreachable!());
            harness
                .catalog
                .insert_action(harness.org_id, action.clone())
                .await
                .unwrap_or_else(|_| unreachable!());
            actions.push(action);
        }

        (invoice, actions)
    }

    async fn seed_role(harness: &Harness, name: &str, entitlements: Vec<Entitlement>) -> RoleDefinition {
        let role =
            RoleDefinition::new(name, OwnerType::Group, "finance", open_policy(), entitlements)
                .unwrap_or_else(|_| unreachable!());
        harness
            .roles
            .insert_role(harness.org_id, role.clone())
            .await
            .unwrap_or_else(|_| unreachable!());
        role
    }

    async fn assign(harness: &Harness, receiver: Receiver, target: AssignmentTarget) {
        harness
            .assignments
            .insert(
                harness.org_id,
                Assignment::new(target, receiver, GrantedVia::Manual),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
    }

    fn concrete(resource_id: &str, action_id: &str) -> Entitlement {
        Entitlement::new(
            format!("{resource_id}-{action_id}"),
            ResourceSelector::Id(resource_id.to_owned()),
            ActionSelector::Id(action_id.to_owned()),
            Scope::Global,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn suite_membership_grants_nested_role_permissions() {
        let harness = harness();
        let (invoice, actions) = seed_catalog(&harness).await;
        let role = seed_role(
            &harness,
            "accounting",
            vec![concrete(invoice.resource_id(), actions[0].action_id())],
        )
        .await;
        let suite = RoleSuiteDefinition::new(
            "finance-pack",
            OwnerType::Group,
            "finance",
            open_policy(),
            vec![role.role_id().to_owned()],
        )
        .unwrap_or_else(|_| unreachable!());
        harness
            .roles
            .insert_suite(harness.org_id, suite.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        let bob = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        assign(
            &harness,
            bob,
            AssignmentTarget::Suite(suite.role_suite_id().to_owned()),
        )
        .await;

        let resolved = harness
            .resolver
            .resolve(
                &admin(harness.org_id),
                &Principal::new("bob", Vec::new()),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            resolved,
            vec![EffectivePermission::new(
                invoice.resource_id(),
                actions[0].action_id(),
                Scope::Global,
            )]
        );
    }

    #[tokio::test]
    async fn group_assignments_contribute_to_the_principal() {
        let harness = harness();
        let (invoice, actions) = seed_catalog(&harness).await;
        let role = seed_role(
            &harness,
            "accounting",
            vec![concrete(invoice.resource_id(), actions[1].action_id())],
        )
        .await;

        let finance = Receiver::group("finance").unwrap_or_else(|_| unreachable!());
        assign(
            &harness,
            finance,
            AssignmentTarget::Role(role.role_id().to_owned()),
        )
        .await;

        let principal = Principal::new("bob", vec!["finance".to_owned()]);
        let resolved = harness
            .resolver
            .resolve(&admin(harness.org_id), &principal)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(resolved.len(), 1);

        let without_group = Principal::new("bob", Vec::new());
        let resolved = harness
            .resolver
            .resolve(&admin(harness.org_id), &without_group)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn wildcard_action_expands_against_the_catalog() {
        let harness = harness();
        let (invoice, actions) = seed_catalog(&harness).await;
        let all_invoice = Entitlement::new(
            "invoice-all",
            ResourceSelector::Id(invoice.resource_id().to_owned()),
            ActionSelector::All,
            Scope::Global,
        )
        .unwrap_or_else(|_| unreachable!());
        let role = seed_role(&harness, "accounting", vec![all_invoice]).await;

        let bob = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        assign(
            &harness,
            bob,
            AssignmentTarget::Role(role.role_id().to_owned()),
        )
        .await;

        let resolved = harness
            .resolver
            .resolve(
                &admin(harness.org_id),
                &Principal::new("bob", Vec::new()),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(resolved.len(), actions.len());
    }

    #[tokio::test]
    async fn overlapping_grants_deduplicate() {
        let harness = harness();
        let (invoice, actions) = seed_catalog(&harness).await;
        let first = seed_role(
            &harness,
            "accounting",
            vec![concrete(invoice.resource_id(), actions[0].action_id())],
        )
        .await;
        let second = seed_role(
            &harness,
            "auditing",
            vec![concrete(invoice.resource_id(), actions[0].action_id())],
        )
        .await;

        let bob = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        assign(
            &harness,
            bob.clone(),
            AssignmentTarget::Role(first.role_id().to_owned()),
        )
        .await;
        assign(
            &harness,
            bob,
            AssignmentTarget::Role(second.role_id().to_owned()),
        )
        .await;

        let resolved = harness
            .resolver
            .resolve(
                &admin(harness.org_id),
                &Principal::new("bob", Vec::new()),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(resolved.len(), 1);
    }

    #[tokio::test]
    async fn scope_matching_is_literal() {
        let harness = harness();
        let (invoice, actions) = seed_catalog(&harness).await;
        let scoped = Entitlement::new(
            "invoice-approve-branch",
            ResourceSelector::Id(invoice.resource_id().to_owned()),
            ActionSelector::Id(actions[1].action_id().to_owned()),
            Scope::Ref("branch-7".to_owned()),
        )
        .unwrap_or_else(|_| unreachable!());
        let role = seed_role(&harness, "accounting", vec![scoped]).await;

        let bob = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        assign(
            &harness,
            bob,
            AssignmentTarget::Role(role.role_id().to_owned()),
        )
        .await;

        let actor = admin(harness.org_id);
        let principal = Principal::new("bob", Vec::new());
        let check = |scope_ref: Option<&str>| PermissionCheck {
            resource_id: invoice.resource_id().to_owned(),
            action_id: actions[1].action_id().to_owned(),
            scope_ref: scope_ref.map(str::to_owned),
        };

        let same_branch = harness
            .resolver
            .has_permission(&actor, &principal, &check(Some("branch-7")))
            .await;
        assert!(same_branch.unwrap_or(false));

        let other_branch = harness
            .resolver
            .has_permission(&actor, &principal, &check(Some("branch-9")))
            .await;
        assert!(!other_branch.unwrap_or(true));

        let global = harness
            .resolver
            .has_permission(&actor, &principal, &check(None))
            .await;
        assert!(!global.unwrap_or(true));
    }

    #[tokio::test]
    async fn concrete_global_grant_answers_only_its_own_scope() {
        let harness = harness();
        let (invoice, actions) = seed_catalog(&harness).await;
        let role = seed_role(
            &harness,
            "accounting",
            vec![concrete(invoice.resource_id(), actions[1].action_id())],
        )
        .await;

        let bob = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        assign(
            &harness,
            bob,
            AssignmentTarget::Role(role.role_id().to_owned()),
        )
        .await;

        let actor = admin(harness.org_id);
        let principal = Principal::new("bob", Vec::new());
        let check = |scope_ref: Option<&str>| PermissionCheck {
            resource_id: invoice.resource_id().to_owned(),
            action_id: actions[1].action_id().to_owned(),
            scope_ref: scope_ref.map(str::to_owned),
        };

        let unscoped = harness
            .resolver
            .has_permission(&actor, &principal, &check(None))
            .await;
        assert!(unscoped.unwrap_or(false));

        let scoped = harness
            .resolver
            .has_permission(&actor, &principal, &check(Some("branch-7")))
            .await;
        assert!(!scoped.unwrap_or(true));
    }

    #[tokio::test]
    async fn wildcard_global_grant_covers_every_scope() {
        let harness = harness();
        let (invoice, actions) = seed_catalog(&harness).await;
        let all_invoice = Entitlement::new(
            "invoice-all",
            ResourceSelector::Id(invoice.resource_id().to_owned()),
            ActionSelector::All,
            Scope::Global,
        )
        .unwrap_or_else(|_| unreachable!());
        let role = seed_role(&harness, "accounting", vec![all_invoice]).await;

        let bob = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        assign(
            &harness,
            bob,
            AssignmentTarget::Role(role.role_id().to_owned()),
        )
        .await;

        let result = harness
            .resolver
            .has_permission(
                &admin(harness.org_id),
                &Principal::new("bob", Vec::new()),
                &PermissionCheck {
                    resource_id: invoice.resource_id().to_owned(),
                    action_id: actions[1].action_id().to_owned(),
                    scope_ref: Some("branch-7".to_owned()),
                },
            )
            .await;
        assert!(result.unwrap_or(false));
    }

    #[tokio::test]
    async fn non_administrators_only_resolve_themselves() {
        let harness = harness();
        let alice = ActorIdentity::new("alice", "Alice", harness.org_id, Vec::new(), false);

        let own = harness
            .resolver
            .resolve(&alice, &Principal::new("alice", Vec::new()))
            .await;
        assert!(own.is_ok());

        let other = harness
            .resolver
            .resolve(&alice, &Principal::new("bob", Vec::new()))
            .await;
        assert!(matches!(other, Err(AppError::Unauthorized(_))));
    }
}
