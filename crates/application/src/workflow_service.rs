use std::sync::Arc;

use entiva_core::{ActorIdentity, AppError, AppResult, Etag};
use entiva_domain::{
    AccessRequest, Assignment, AssignmentTarget, GrantedVia, HistoryReason, HistoryRecord,
    HistoryRefs, Receiver, RequestKind, RequestPolicy,
};

use crate::access::ensure_administrator;
use crate::{
    AssignmentRepository, CreateGrantRequestInput, CreateRevokeRequestInput, HistoryRepository,
    ReceiverDirectory, RequestQuery, RequestRepository, RoleRepository,
};

/// Application service for the grant/revoke request workflow.
///
/// Grant requests wait for an approver decision; revoke requests take effect
/// immediately and are stored already approved, attributed to the submitter.
#[derive(Clone)]
pub struct WorkflowService {
    requests: Arc<dyn RequestRepository>,
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    history: Arc<dyn HistoryRepository>,
    directory: Arc<dyn ReceiverDirectory>,
}

impl WorkflowService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        requests: Arc<dyn RequestRepository>,
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        history: Arc<dyn HistoryRepository>,
        directory: Arc<dyn ReceiverDirectory>,
    ) -> Self {
        Self {
            requests,
            roles,
            assignments,
            history,
            directory,
        }
    }

    async fn target_policy(
        &self,
        actor: &ActorIdentity,
        target: &AssignmentTarget,
    ) -> AppResult<RequestPolicy> {
        let policy = match target {
            AssignmentTarget::Role(role_id) => self
                .roles
                .find_role(actor.org_id(), role_id)
                .await?
                .map(|role| role.policy()),
            AssignmentTarget::Suite(role_suite_id) => self
                .roles
                .find_suite(actor.org_id(), role_suite_id)
                .await?
                .map(|suite| suite.policy()),
        };

        policy.ok_or_else(|| {
            AppError::InvalidReference(format!(
                "{} '{}' does not exist",
                target.target_type(),
                target.target_id()
            ))
        })
    }

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

    fn refs_for(request: &AccessRequest) -> HistoryRefs {
        let mut refs = HistoryRefs::default();
        match request.target() {
            AssignmentTarget::Role(role_id) => refs.role_id = Some(role_id.clone()),
            AssignmentTarget::Suite(role_suite_id) => {
                refs.role_suite_id = Some(role_suite_id.clone());
            }
        }
        match request.kind() {
            RequestKind::Grant => refs.grant_request_id = Some(request.request_id().to_owned()),
            RequestKind::Revoke => refs.revoke_request_id = Some(request.request_id().to_owned()),
        }

        refs
    }

    /// Submits a grant request for approval.
    pub async fn submit_grant(
        &self,
        actor: &ActorIdentity,
        input: CreateGrantRequestInput,
    ) -> AppResult<AccessRequest> {
        let receiver = Receiver::new(input.receiver_type, input.receiver_id)?;
        let target = AssignmentTarget::from_parts(input.target_type.as_str(), input.target_id)?;

        let policy = self.target_policy(actor, &target).await?;
        if !policy.is_requestable {
            return Err(AppError::Validation(format!(
                "{} '{}' is not requestable",
                target.target_type(),
                target.target_id()
            )));
        }
        if policy.is_required_comment
            && input.comment.as_deref().is_none_or(|value| value.trim().is_empty())
        {
            return Err(AppError::Validation(format!(
                "{} '{}' requires a comment on grant requests",
                target.target_type(),
                target.target_id()
            )));
        }
        if policy.is_required_attachment
            && input
                .attachment_url
                .as_deref()
                .is_none_or(|value| value.trim().is_empty())
        {
            return Err(AppError::Validation(format!(
                "{} '{}' requires an attachment on grant requests",
                target.target_type(),
                target.target_id()
            )));
        }

        self.check_receiver(actor, &receiver).await?;

        let request = AccessRequest::new(
            RequestKind::Grant,
            actor.subject(),
            receiver,
            target,
            input.comment,
            input.attachment_url,
        )?;
        self.requests.insert(actor.org_id(), request.clone()).await?;

        tracing::info!(request_id = request.request_id(), "grant request submitted");
        Ok(request)
    }

    /// Submits a revoke request; the assignment is removed immediately and
    /// the request is stored in its terminal approved state.
    pub async fn submit_revoke(
        &self,
        actor: &ActorIdentity,
        input: CreateRevokeRequestInput,
    ) -> AppResult<AccessRequest> {
        let receiver = Receiver::new(input.receiver_type, input.receiver_id)?;
        let target = AssignmentTarget::from_parts(input.target_type.as_str(), input.target_id)?;
        self.target_policy(actor, &target).await?;

        self.assignments
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

        let mut request = AccessRequest::new(
            RequestKind::Revoke,
            actor.subject(),
            receiver.clone(),
            target,
            input.comment,
            input.attachment_url,
        )?;
        request.approve(actor.subject())?;
        self.requests.insert(actor.org_id(), request.clone()).await?;

        let metadata = request
            .comment()
            .map(|comment| serde_json::json!({ "comment": comment }));
        self.history
            .append(
                actor.org_id(),
                HistoryRecord::new(
                    HistoryReason::RequestRevoked,
                    receiver,
                    Self::refs_for(&request),
                    Some(actor.subject().to_owned()),
                    metadata,
                ),
            )
            .await?;

        tracing::info!(request_id = request.request_id(), "revoke request applied");
        Ok(request)
    }

    /// Returns one request; non-administrators only see their own.
    pub async fn get_request(
        &self,
        actor: &ActorIdentity,
        request_id: &str,
    ) -> AppResult<AccessRequest> {
        let request = self
            .requests
            .find(actor.org_id(), request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("request '{request_id}' does not exist")))?;

        if !actor.is_administrator() && request.requestor_id().as_str() != actor.subject() {
            return Err(AppError::NotFound(format!(
                "request '{request_id}' does not exist"
            )));
        }

        Ok(request)
    }

    /// Lists requests; non-administrators only see their own.
    pub async fn list_requests(
        &self,
        actor: &ActorIdentity,
        query: RequestQuery,
    ) -> AppResult<Vec<AccessRequest>> {
        let mut requests = self.requests.list(actor.org_id(), query).await?;
        if !actor.is_administrator() {
            requests.retain(|request| request.requestor_id().as_str() == actor.subject());
        }

        Ok(requests)
    }

    /// Approves a pending grant request and applies the assignment.
    ///
    /// The status transition is a compare-and-swap on the request's etag, so
    /// exactly one of any set of racing approvals takes effect; the losers
    /// fail with `Conflict` or `InvalidState`.
    pub async fn approve(
        &self,
        actor: &ActorIdentity,
        request_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<AccessRequest> {
        ensure_administrator(actor)?;

        let mut request = self
            .requests
            .find(actor.org_id(), request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("request '{request_id}' does not exist")))?;
        request.approve(actor.subject())?;
        self.requests
            .transition(actor.org_id(), request.clone(), expected_etag)
            .await?;

        let assignment = Assignment::new(
            request.target().clone(),
            request.receiver().clone(),
            GrantedVia::GrantRequest,
        );
        if !self.assignments.insert(actor.org_id(), assignment).await? {
            tracing::debug!(request_id, "receiver already held the assignment");
        }

        // The decision is recorded even when the assignment already existed;
        // exactly-once under racing approvals rests on the etag/status CAS.
        self.history
            .append(
                actor.org_id(),
                HistoryRecord::new(
                    HistoryReason::RequestGranted,
                    request.receiver().clone(),
                    Self::refs_for(&request),
                    Some(actor.subject().to_owned()),
                    None,
                ),
            )
            .await?;

        tracing::info!(request_id, "grant request approved");
        Ok(request)
    }

    /// Rejects a pending request; no permission changes, so no history.
    pub async fn reject(
        &self,
        actor: &ActorIdentity,
        request_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<AccessRequest> {
        ensure_administrator(actor)?;

        let mut request = self
            .requests
            .find(actor.org_id(), request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("request '{request_id}' does not exist")))?;
        request.reject(actor.subject())?;
        self.requests
            .transition(actor.org_id(), request.clone(), expected_etag)
            .await?;

        tracing::info!(request_id, "request rejected");
        Ok(request)
    }

    /// Cancels a pending request; allowed for the requestor or an
    /// administrator. No permission changes, so no history.
    pub async fn cancel(
        &self,
        actor: &ActorIdentity,
        request_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<AccessRequest> {
        let mut request = self
            .requests
            .find(actor.org_id(), request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("request '{request_id}' does not exist")))?;
        request.cancel(actor.subject(), actor.is_administrator())?;
        self.requests
            .transition(actor.org_id(), request.clone(), expected_etag)
            .await?;

        tracing::info!(request_id, "request cancelled");
        Ok(request)
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
        AccessRequest, Assignment, AssignmentTarget, GrantedVia, HistoryReason, HistoryRecord,
        OwnerType, Receiver, ReceiverType, RequestPolicy, RequestStatus, RoleDefinition,
        RoleSuiteDefinition,
    };

    use crate::lifecycle_ports::HistoryQuery;
    use crate::{
        CreateGrantRequestInput, CreateRevokeRequestInput, RequestQuery, RoleDeleteOutcome,
        SuiteDeleteOutcome,
    };

    use super::{
        AssignmentRepository, HistoryRepository, ReceiverDirectory, RequestRepository,
        RoleRepository, WorkflowService,
    };

    #[derive(Default)]
    struct FakeRequestRepository {
        requests: Mutex<HashMap<String, AccessRequest>>,
    }

    #[async_trait]
    impl RequestRepository for FakeRequestRepository {
        async fn insert(&self, _org_id: OrgId, request: AccessRequest) -> AppResult<()> {
            self.requests
                .lock()
                .await
                .insert(request.request_id().to_owned(), request);
            Ok(())
        }

        async fn find(
            &self,
            _org_id: OrgId,
            request_id: &str,
        ) -> AppResult<Option<AccessRequest>> {
            Ok(self.requests.lock().await.get(request_id).cloned())
        }

        async fn list(
            &self,
            _org_id: OrgId,
            query: RequestQuery,
        ) -> AppResult<Vec<AccessRequest>> {
            Ok(self
                .requests
                .lock()
                .await
                .values()
                .filter(|request| {
                    query.kind.is_none_or(|kind| request.kind() == kind)
                        && query.status.is_none_or(|status| request.status() == status)
                })
                .cloned()
                .collect())
        }

        async fn transition(
            &self,
            _org_id: OrgId,
            request: AccessRequest,
            expected_etag: &Etag,
        ) -> AppResult<()> {
            let mut requests = self.requests.lock().await;
            let stored = requests.get(request.request_id()).ok_or_else(|| {
                AppError::NotFound(format!("request '{}' does not exist", request.request_id()))
            })?;
            if !stored.etag().matches(expected_etag) || stored.status().is_terminal() {
                return Err(AppError::Conflict(format!(
                    "request '{}' was decided concurrently",
                    request.request_id()
                )));
            }

            requests.insert(request.request_id().to_owned(), request);
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

    struct AlwaysKnownDirectory;

    #[async_trait]
    impl ReceiverDirectory for AlwaysKnownDirectory {
        async fn receiver_exists(&self, _org_id: OrgId, _receiver: &Receiver) -> AppResult<bool> {
            Ok(true)
        }
    }

    struct Harness {
        service: WorkflowService,
        roles: Arc<FakeRoleRepository>,
        assignments: Arc<FakeAssignmentRepository>,
        history: Arc<FakeHistoryRepository>,
    }

    fn harness() -> Harness {
        let roles = Arc::new(FakeRoleRepository::default());
        let assignments = Arc::new(FakeAssignmentRepository::default());
        let history = Arc::new(FakeHistoryRepository::default());
        let service = WorkflowService::new(
            Arc::new(FakeRequestRepository::default()),
            roles.clone(),
            assignments.clone(),
            history.clone(),
            Arc::new(AlwaysKnownDirectory),
        );
        Harness {
            service,
            roles,
            assignments,
            history,
        }
    }

    fn admin() -> ActorIdentity {
        ActorIdentity::new("root", "Root", OrgId::new(), Vec::new(), true)
    }

    fn requestor(org_id: OrgId) -> ActorIdentity {
        ActorIdentity::new("alice", "Alice", org_id, Vec::new(), false)
    }

    async fn seed_role(harness: &Harness, org_id: OrgId, policy: RequestPolicy) -> RoleDefinition {
        let role = RoleDefinition::new("accounting", OwnerType::Group, "finance", policy, Vec::new())
            .unwrap_or_else(|_| unreachable!());
        harness
            .roles
            .insert_role(org_id, role.clone())
            .await
            .unwrap_or_else(|_| unreachable!());
        role
    }

    fn open_policy() -> RequestPolicy {
        RequestPolicy {
            is_requestable: true,
            is_required_attachment: false,
            is_required_comment: false,
        }
    }

    fn grant_input(role: &RoleDefinition) -> CreateGrantRequestInput {
        CreateGrantRequestInput {
            receiver_type: ReceiverType::User,
            receiver_id: "bob".to_owned(),
            target_type: "role".to_owned(),
            target_id: role.role_id().to_owned(),
            comment: None,
            attachment_url: None,
        }
    }

    #[tokio::test]
    async fn non_requestable_target_rejects_submission() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(
            &harness,
            actor.org_id(),
            RequestPolicy {
                is_requestable: false,
                is_required_attachment: false,
                is_required_comment: false,
            },
        )
        .await;

        let result = harness.service.submit_grant(&actor, grant_input(&role)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn required_comment_is_enforced() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(
            &harness,
            actor.org_id(),
            RequestPolicy {
                is_requestable: true,
                is_required_attachment: false,
                is_required_comment: true,
            },
        )
        .await;

        let mut input = grant_input(&role);
        input.comment = Some("   ".to_owned());
        let result = harness.service.submit_grant(&actor, input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let mut input = grant_input(&role);
        input.comment = Some("quarter-end closing".to_owned());
        assert!(harness.service.submit_grant(&actor, input).await.is_ok());
    }

    #[tokio::test]
    async fn approval_applies_assignment_and_history_once() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;

        let request = harness
            .service
            .submit_grant(&requestor(actor.org_id()), grant_input(&role))
            .await
            .unwrap_or_else(|_| unreachable!());

        let approved = harness
            .service
            .approve(&actor, request.request_id(), request.etag())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(approved.status(), RequestStatus::Approved);
        assert_eq!(approved.decided_by(), Some("root"));
        assert_eq!(harness.assignments.assignments.lock().await.len(), 1);

        let records = harness.history.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reason(), HistoryReason::RequestGranted);
        assert_eq!(
            records[0].refs().grant_request_id.as_deref(),
            Some(request.request_id())
        );
    }

    #[tokio::test]
    async fn approval_over_existing_assignment_still_records_history() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;

        let receiver = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        let target = AssignmentTarget::Role(role.role_id().to_owned());
        harness
            .assignments
            .insert(
                actor.org_id(),
                Assignment::new(target.clone(), receiver, GrantedVia::Manual),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        let request = harness
            .service
            .submit_grant(&requestor(actor.org_id()), grant_input(&role))
            .await
            .unwrap_or_else(|_| unreachable!());
        harness
            .service
            .approve(&actor, request.request_id(), request.etag())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(harness.assignments.assignments.lock().await.len(), 1);
        let records = harness.history.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reason(), HistoryReason::RequestGranted);
    }

    #[tokio::test]
    async fn racing_approvals_decide_exactly_once() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;

        let request = harness
            .service
            .submit_grant(&requestor(actor.org_id()), grant_input(&role))
            .await
            .unwrap_or_else(|_| unreachable!());

        let first = {
            let service = harness.service.clone();
            let actor = actor.clone();
            let request_id = request.request_id().to_owned();
            let etag = request.etag().to_owned();
            tokio::spawn(async move { service.approve(&actor, &request_id, &etag).await })
        };
        let second = {
            let service = harness.service.clone();
            let actor = actor.clone();
            let request_id = request.request_id().to_owned();
            let etag = request.etag().to_owned();
            tokio::spawn(async move { service.approve(&actor, &request_id, &etag).await })
        };

        let outcomes = [
            first.await.unwrap_or_else(|_| unreachable!()),
            second.await.unwrap_or_else(|_| unreachable!()),
        ];
        let wins = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        assert_eq!(wins, 1);
        for outcome in &outcomes {
            if let Err(error) = outcome {
                assert!(matches!(
                    error,
                    AppError::Conflict(_) | AppError::InvalidState(_)
                ));
            }
        }

        assert_eq!(harness.assignments.assignments.lock().await.len(), 1);
        assert_eq!(harness.history.records.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn second_decision_fails_on_terminal_request() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;

        let request = harness
            .service
            .submit_grant(&actor, grant_input(&role))
            .await
            .unwrap_or_else(|_| unreachable!());
        let approved = harness
            .service
            .approve(&actor, request.request_id(), request.etag())
            .await
            .unwrap_or_else(|_| unreachable!());

        let again = harness
            .service
            .approve(&actor, request.request_id(), approved.etag())
            .await;
        assert!(matches!(again, Err(AppError::InvalidState(_))));
        assert_eq!(harness.assignments.assignments.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn stale_etag_decision_conflicts_without_side_effects() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;

        let request = harness
            .service
            .submit_grant(&actor, grant_input(&role))
            .await
            .unwrap_or_else(|_| unreachable!());

        let result = harness
            .service
            .approve(&actor, request.request_id(), &Etag::new())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(harness.assignments.assignments.lock().await.is_empty());
        assert!(harness.history.records.lock().await.is_empty());
    }

    #[tokio::test]
    async fn cancel_is_restricted_to_requestor_or_administrator() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;
        let alice = requestor(actor.org_id());

        let request = harness
            .service
            .submit_grant(&alice, grant_input(&role))
            .await
            .unwrap_or_else(|_| unreachable!());

        let stranger = ActorIdentity::new("mallory", "Mallory", actor.org_id(), Vec::new(), false);
        let denied = harness
            .service
            .cancel(&stranger, request.request_id(), request.etag())
            .await;
        assert!(matches!(denied, Err(AppError::Validation(_))));

        let cancelled = harness
            .service
            .cancel(&alice, request.request_id(), request.etag())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(cancelled.status(), RequestStatus::Cancelled);
        assert!(harness.history.records.lock().await.is_empty());
    }

    #[tokio::test]
    async fn revoke_request_takes_effect_immediately() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;

        let receiver = Receiver::user("bob").unwrap_or_else(|_| unreachable!());
        let target = AssignmentTarget::Role(role.role_id().to_owned());
        harness
            .assignments
            .insert(
                actor.org_id(),
                Assignment::new(target.clone(), receiver, GrantedVia::Manual),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        let request = harness
            .service
            .submit_revoke(
                &actor,
                CreateRevokeRequestInput {
                    receiver_type: ReceiverType::User,
                    receiver_id: "bob".to_owned(),
                    target_type: "role".to_owned(),
                    target_id: role.role_id().to_owned(),
                    comment: None,
                    attachment_url: None,
                },
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(request.status(), RequestStatus::Approved);
        assert!(harness.assignments.assignments.lock().await.is_empty());

        let records = harness.history.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reason(), HistoryReason::RequestRevoked);
        assert_eq!(
            records[0].refs().revoke_request_id.as_deref(),
            Some(request.request_id())
        );
    }

    #[tokio::test]
    async fn revoke_of_missing_assignment_stores_nothing() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;

        let result = harness
            .service
            .submit_revoke(
                &actor,
                CreateRevokeRequestInput {
                    receiver_type: ReceiverType::User,
                    receiver_id: "bob".to_owned(),
                    target_type: "role".to_owned(),
                    target_id: role.role_id().to_owned(),
                    comment: None,
                    attachment_url: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let listed = harness
            .service
            .list_requests(&actor, RequestQuery::default())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn non_administrators_only_see_their_own_requests() {
        let harness = harness();
        let actor = admin();
        let role = seed_role(&harness, actor.org_id(), open_policy()).await;
        let alice = requestor(actor.org_id());

        harness
            .service
            .submit_grant(&alice, grant_input(&role))
            .await
            .unwrap_or_else(|_| unreachable!());
        let admins_request = harness
            .service
            .submit_grant(&actor, grant_input(&role))
            .await
            .unwrap_or_else(|_| unreachable!());

        let visible = harness
            .service
            .list_requests(&alice, RequestQuery::default())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].requestor_id().as_str(), "alice");

        let hidden = harness
            .service
            .get_request(&alice, admins_request.request_id())
            .await;
        assert!(matches!(hidden, Err(AppError::NotFound(_))));
    }
}
