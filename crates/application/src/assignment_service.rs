use std::sync::Arc;

use entiva_core::{ActorIdentity, AppError, AppResult};
use entiva_domain::{
    Assignment, AssignmentTarget, GrantedVia, HistoryReason, HistoryRecord, HistoryRefs, Receiver,
};

use crate::access::ensure_administrator;
use crate::{AssignmentRepository, HistoryRepository, ReceiverDirectory, RoleRepository};

/// Application service for direct administrative grants and revokes.
///
/// The request workflow is the normal path to an assignment; this service is
/// the administrator shortcut that skips the approval step but still leaves
/// the same history trail.
#[derive(Clone)]
pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepository>,
    roles: Arc<dyn RoleRepository>,
    history: Arc<dyn HistoryRepository>,
    directory: Arc<dyn ReceiverDirectory>,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        assignments: Arc<dyn AssignmentRepository>,
        roles: Arc<dyn RoleRepository>,
        history: Arc<dyn HistoryRepository>,
        directory: Arc<dyn ReceiverDirectory>,
    ) -> Self {
        Self {
            assignments,
            roles,
            history,
            directory,
        }
    }

    async fn ensure_target_exists(
        &self,
        actor: &ActorIdentity,
        target: &AssignmentTarget,
    ) -> AppResult<()> {
        let exists = match target {
            AssignmentTarget::Role(role_id) => self
                .roles
                .find_role(actor.org_id(), role_id)
                .await?
                .is_some(),
            AssignmentTarget::Suite(role_suite_id) => self
                .roles
                .find_suite(actor.org_id(), role_suite_id)
                .await?
                .is_some(),
        };

        if !exists {
            return Err(AppError::InvalidReference(format!(
                "{} '{}' does not exist",
                target.target_type(),
                target.target_id()
            )));
        }

        Ok(())
    }

    /// Checks the receiver against the external directory.
    ///
    /// A directory failure degrades gracefully: the raw receiver id is kept
    /// and the operation proceeds. A definite "does not exist" answer is a
    /// hard invalid reference.
    async fn check_receiver(&self, actor: &ActorIdentity, receiver: &Receiver) -> AppResult<()> {
        match self.directory.receiver_exists(actor.org_id(), receiver).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::InvalidReference(format!(
                "{} '{}' is unknown to the directory",
                receiver.receiver_type.as_str(),
                receiver.receiver_id
            ))),
            Err(error) => {
                tracing::warn!(
                    receiver_id = receiver.receiver_id.as_str(),
                    %error,
                    "receiver directory unavailable, proceeding with raw id"
                );
                Ok(())
            }
        }
    }

    fn refs_for(target: &AssignmentTarget) -> HistoryRefs {
        match target {
            AssignmentTarget::Role(role_id) => HistoryRefs {
                role_id: Some(role_id.clone()),
                ..HistoryRefs::default()
            },
            AssignmentTarget::Suite(role_suite_id) => HistoryRefs {
                role_suite_id: Some(role_suite_id.clone()),
                ..HistoryRefs::default()
            },
        }
    }

    /// Grants a role or suite directly to a receiver.
    pub async fn grant(
        &self,
        actor: &ActorIdentity,
        receiver: Receiver,
        target: AssignmentTarget,
    ) -> AppResult<Assignment> {
        ensure_administrator(actor)?;
        self.ensure_target_exists(actor, &target).await?;
        self.check_receiver(actor, &receiver).await?;

        let assignment = Assignment::new(target.clone(), receiver.clone(), GrantedVia::Manual);
        if !self
            .assignments
            .insert(actor.org_id(), assignment.clone())
            .await?
        {
            return Err(AppError::AlreadyExists(format!(
                "{} '{}' is already assigned to {} '{}'",
                target.target_type(),
                target.target_id(),
                receiver.receiver_type.as_str(),
                receiver.receiver_id
            )));
        }

        self.history
            .append(
                actor.org_id(),
                HistoryRecord::new(
                    HistoryReason::ManualGranted,
                    receiver,
                    Self::refs_for(&target),
                    Some(actor.subject().to_owned()),
                    None,
                ),
            )
            .await?;

        tracing::info!(
            target_type = target.target_type(),
            target_id = target.target_id(),
            "assignment granted manually"
        );
        Ok(assignment)
    }

    /// Removes an assignment directly.
    pub async fn revoke(
        &self,
        actor: &ActorIdentity,
        receiver: Receiver,
        target: AssignmentTarget,
    ) -> AppResult<Assignment> {
        ensure_administrator(actor)?;

        let removed = self
            .assignments
            .remove(actor.org_id(), &target, &receiver)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} '{}' is not assigned to {} '{}'",
                    target.target_type(),
                    target.target_id(),
                    receiver.receiver_type.as_str(),
                    receiver.receiver_id
                ))
            })?;

        let reason = match &target {
            AssignmentTarget::Role(_) => HistoryReason::RoleRemoved,
            AssignmentTarget::Suite(_) => HistoryReason::SuiteRemoved,
        };
        self.history
            .append(
                actor.org_id(),
                HistoryRecord::new(
                    reason,
                    receiver,
                    Self::refs_for(&target),
                    Some(actor.subject().to_owned()),
                    None,
                ),
            )
            .await?;

        tracing::info!(
            target_type = target.target_type(),
            target_id = target.target_id(),
            "assignment revoked manually"
        );
        Ok(removed)
    }

    /// Lists every assignment; administrative view.
    pub async fn list(&self, actor: &ActorIdentity) -> AppResult<Vec<Assignment>> {
        ensure_administrator(actor)?;
        self.assignments.list(actor.org_id()).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use entiva_core::{ActorIdentity, AppError, AppResult, Etag, OrgId};
    use entiva_domain::{
        Assignment, AssignmentTarget, HistoryReason, HistoryRecord, OwnerType, Receiver,
        RequestPolicy, RoleDefinition, RoleSuiteDefinition,
    };

    use crate::lifecycle_ports::HistoryQuery;
    use crate::{RoleDeleteOutcome, SuiteDeleteOutcome};

    use super::{
        AssignmentRepository, AssignmentService, HistoryRepository, ReceiverDirectory,
        RoleRepository,
    };

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
            let mut assignments = self.assignments.lock().await;
            if assignments.iter().any(|binding| {
                binding.target() == assignment.target()
                    && binding.receiver() == assignment.receiver()
            }) {
                return Ok(false);
            }

            assignments.push(assignment);
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

    #[derive(Default)]
    struct FakeHistoryRepository {
        records: Mutex<Vec<HistoryRecord>>,
    }

    #[async_trait]
    impl HistoryRepository for FakeHistoryRepository {
        async fn append(&self, _org_id: OrgId, record: HistoryRecord) -> AppResult<()> {
            self.records.lock().await.push(record);
            Ok(())
        }

        async fn list(
            &self,
            _org_id: OrgId,
            _query: HistoryQuery,
        ) -> AppResult<Vec<HistoryRecord>> {
            Ok(self.records.lock().await.clone())
        }
    }

    enum DirectoryMode {
        Exists,
        Missing,
        Failing,
    }

    struct FakeReceiverDirectory {
        mode: DirectoryMode,
    }

    #[async_trait]
    impl ReceiverDirectory for FakeReceiverDirectory {
        async fn receiver_exists(&self, _org_id: OrgId, _receiver: &Receiver) -> AppResult<bool> {
            match self.mode {
                DirectoryMode::Exists => Ok(true),
                DirectoryMode::Missing => Ok(false),
                DirectoryMode::Failing => {
                    Err(AppError::Internal("directory unreachable".to_owned()))
                }
            }
        }
    }

    struct Harness {
        service: AssignmentService,
        roles: Arc<FakeRoleRepository>,
        history: Arc<FakeHistoryRepository>,
    }

    fn harness(mode: DirectoryMode) -> Harness {
        let roles = Arc::new(FakeRoleRepository::default());
        let history = Arc::new(FakeHistoryRepository::default());
        let service = AssignmentService::new(
            Arc::new(FakeAssignmentRepository::default()),
            roles.clone(),
            history.clone(),
            Arc::new(FakeReceiverDirectory { mode }),
        );
        Harness {
            service,
            roles,
            history,
        }
    }

    fn admin() -> ActorIdentity {
        ActorIdentity::new("root", "Root", OrgId::new(), Vec::new(), true)
    }

    fn open_policy() -> RequestPolicy {
        RequestPolicy {
            is_requestable: true,
            is_required_attachment: false,
            is_required_comment: false,
        }
    }

    async fn seed_role(harness: &Harness, actor: &ActorIdentity) -> RoleDefinition {
        let role = RoleDefinition::new(
            "accounting",
            OwnerType::Group,
            "finance",
            open_policy(),
            Vec::new(),
        )
        .unwrap_or_else(|_| unreachable!());
        harness
            .roles
            .insert_role(actor.org_id(), role.clone())
            .await
            .unwrap_or_else(|_| unreachable!());
        role
    }

    #[tokio::test]
    async fn manual_grant_records_history() {
        let harness = harness(DirectoryMode::Exists);
        let actor = admin();
        let role = seed_role(&harness, &actor).await;

        let receiver = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        let result = harness
            .service
            .grant(
                &actor,
                receiver,
                AssignmentTarget::Role(role.role_id().to_owned()),
            )
            .await;
        assert!(result.is_ok());

        let records = harness.history.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reason(), HistoryReason::ManualGranted);
        assert_eq!(records[0].approver_id(), Some("root"));
    }

    #[tokio::test]
    async fn duplicate_grant_already_exists() {
        let harness = harness(DirectoryMode::Exists);
        let actor = admin();
        let role = seed_role(&harness, &actor).await;
        let receiver = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        let target = AssignmentTarget::Role(role.role_id().to_owned());

        harness
            .service
            .grant(&actor, receiver.clone(), target.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        let result = harness.service.grant(&actor, receiver, target).await;
        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn unknown_target_is_an_invalid_reference() {
        let harness = harness(DirectoryMode::Exists);

        let result = harness
            .service
            .grant(
                &admin(),
                Receiver::user("bob").unwrap_or_else(|_| unreachable!()),
                AssignmentTarget::Role("missing".to_owned()),
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn unknown_receiver_is_an_invalid_reference() {
        let harness = harness(DirectoryMode::Missing);
        let actor = admin();
        let role = seed_role(&harness, &actor).await;

        let result = harness
            .service
            .grant(
                &actor,
                Receiver::user("ghost").unwrap_or_else(|_| unreachable!()),
                AssignmentTarget::Role(role.role_id().to_owned()),
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn directory_failure_degrades_gracefully() {
        let harness = harness(DirectoryMode::Failing);
        let actor = admin();
        let role = seed_role(&harness, &actor).await;

        let result = harness
            .service
            .grant(
                &actor,
                Receiver::user("bob").unwrap_or_else(|_| unreachable!()),
                AssignmentTarget::Role(role.role_id().to_owned()),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn revoke_of_missing_assignment_is_not_found() {
        let harness = harness(DirectoryMode::Exists);
        let actor = admin();
        let role = seed_role(&harness, &actor).await;

        let result = harness
            .service
            .revoke(
                &actor,
                Receiver::user("bob").unwrap_or_else(|_| unreachable!()),
                AssignmentTarget::Role(role.role_id().to_owned()),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn revoke_reason_follows_target_kind() {
        let harness = harness(DirectoryMode::Exists);
        let actor = admin();
        let role = seed_role(&harness, &actor).await;
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
            .insert_suite(actor.org_id(), suite.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        let receiver = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        let role_target = AssignmentTarget::Role(role.role_id().to_owned());
        let suite_target = AssignmentTarget::Suite(suite.role_suite_id().to_owned());

        harness
            .service
            .grant(&actor, receiver.clone(), role_target.clone())
            .await
            .unwrap_or_else(|_| unreachable!());
        harness
            .service
            .grant(&actor, receiver.clone(), suite_target.clone())
            .await
            .unwrap_or_else(|_| unreachable!());
        harness
            .service
            .revoke(&actor, receiver.clone(), role_target)
            .await
            .unwrap_or_else(|_| unreachable!());
        harness
            .service
            .revoke(&actor, receiver, suite_target)
            .await
            .unwrap_or_else(|_| unreachable!());

        let records = harness.history.records.lock().await;
        let reasons: Vec<_> = records.iter().map(HistoryRecord::reason).collect();
        assert!(reasons.contains(&HistoryReason::RoleRemoved));
        assert!(reasons.contains(&HistoryReason::SuiteRemoved));
    }
}
