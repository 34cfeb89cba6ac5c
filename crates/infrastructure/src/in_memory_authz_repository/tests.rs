use entiva_application::{
    AssignmentRepository, CatalogRepository, EntitlementRepository, HistoryQuery,
    HistoryRepository, RequestQuery, RequestRepository, RoleRepository,
};
use entiva_core::{AppError, OrgId};
use entiva_domain::{
    AccessRequest, ActionSelector, Assignment, AssignmentTarget, Entitlement, GrantedVia,
    HistoryReason, HistoryRecord, HistoryRefs, OwnerType, Receiver, RequestKind, RequestPolicy,
    ResourceDefinition, ResourceSelector, RoleDefinition, RoleSuiteDefinition, Scope, ScopeKind,
};

use super::InMemoryAuthzRepository;

fn open_policy() -> RequestPolicy {
    RequestPolicy {
        is_requestable: true,
        is_required_attachment: false,
        is_required_comment: false,
    }
}

fn entitlement(name: &str) -> Entitlement {
    Entitlement::new(
        name,
        ResourceSelector::Id("invoice".to_owned()),
        ActionSelector::Id("approve".to_owned()),
        Scope::Global,
    )
    .unwrap_or_else(|_| unreachable!())
}

fn role(name: &str, members: Vec<Entitlement>) -> RoleDefinition {
    RoleDefinition::new(name, OwnerType::Group, "finance", open_policy(), members)
        .unwrap_or_else(|_| unreachable!())
}

fn suite(name: &str, role_ids: Vec<String>) -> RoleSuiteDefinition {
    RoleSuiteDefinition::new(name, OwnerType::Group, "finance", open_policy(), role_ids)
        .unwrap_or_else(|_| unreachable!())
}

fn user(id: &str) -> Receiver {
    Receiver::user(id).unwrap_or_else(|_| unreachable!())
}

fn role_assignment(role_id: &str, receiver: Receiver) -> Assignment {
    Assignment::new(
        AssignmentTarget::Role(role_id.to_owned()),
        receiver,
        GrantedVia::Manual,
    )
}

fn grant_request(requestor: &str, receiver: Receiver) -> AccessRequest {
    AccessRequest::new(
        RequestKind::Grant,
        requestor,
        receiver,
        AssignmentTarget::Role("role-1".to_owned()),
        None,
        None,
    )
    .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn resource_names_are_unique_within_one_organization() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();
    let other_org = OrgId::new();

    let resource = ResourceDefinition::new("invoice", "document", None, ScopeKind::Global)
        .unwrap_or_else(|_| unreachable!());
    assert!(store.insert_resource(org, resource).await.is_ok());

    let duplicate = ResourceDefinition::new("invoice", "document", None, ScopeKind::Global)
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(
        store.insert_resource(org, duplicate).await,
        Err(AppError::AlreadyExists(_))
    ));

    let elsewhere = ResourceDefinition::new("invoice", "document", None, ScopeKind::Global)
        .unwrap_or_else(|_| unreachable!());
    assert!(store.insert_resource(other_org, elsewhere).await.is_ok());
}

#[tokio::test]
async fn save_role_with_stale_etag_is_a_conflict() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();

    let role = role("accounting", Vec::new());
    let stale = role.etag().clone();
    store
        .insert_role(org, role.clone())
        .await
        .unwrap_or_else(|_| unreachable!());

    let mut updated = role.clone();
    updated
        .update("accounting-v2", open_policy())
        .unwrap_or_else(|_| unreachable!());
    store
        .save_role(org, updated.clone(), &stale)
        .await
        .unwrap_or_else(|_| unreachable!());

    // The first save replaced the stored state, so the stale token loses.
    let result = store.save_role(org, updated, &stale).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn assignment_insert_is_idempotent() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();

    let first = role_assignment("role-1", user("bob"));
    let second = role_assignment("role-1", user("bob"));

    let inserted = AssignmentRepository::insert(&store, org, first)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(inserted);

    let inserted_again = AssignmentRepository::insert(&store, org, second)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!inserted_again);
}

#[tokio::test]
async fn role_delete_detaches_suites_and_records_history() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();

    let role = role("accounting", Vec::new());
    let role_id = role.role_id().to_owned();
    let role_etag = role.etag().clone();
    store
        .insert_role(org, role)
        .await
        .unwrap_or_else(|_| unreachable!());

    let suite = suite("finance-pack", vec![role_id.clone()]);
    let suite_id = suite.role_suite_id().to_owned();
    let suite_etag = suite.etag().clone();
    store
        .insert_suite(org, suite)
        .await
        .unwrap_or_else(|_| unreachable!());

    AssignmentRepository::insert(&store, org, role_assignment(&role_id, user("bob")))
        .await
        .unwrap_or_else(|_| unreachable!());
    AssignmentRepository::insert(
        &store,
        org,
        Assignment::new(
            AssignmentTarget::Suite(suite_id.clone()),
            user("carol"),
            GrantedVia::Manual,
        ),
    )
    .await
    .unwrap_or_else(|_| unreachable!());

    let outcome = store
        .delete_role(org, &role_id, &role_etag, "admin")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(outcome.detached_suite_ids, vec![suite_id.clone()]);
    assert_eq!(outcome.removed_assignments.len(), 1);

    match store
        .find_suite(org, &suite_id)
        .await
        .unwrap_or_else(|_| unreachable!())
    {
        Some(stripped) => {
            assert!(stripped.role_ids().is_empty());
            assert!(!stripped.etag().matches(&suite_etag));
        }
        None => unreachable!(),
    }

    let records = HistoryRepository::list(&store, org, HistoryQuery::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|record| {
        record.reason() == HistoryReason::RoleDeleted
            && record.receiver().receiver_id == "bob"
            && record.refs().role_id.as_deref() == Some(role_id.as_str())
    }));
    assert!(records.iter().any(|record| {
        record.reason() == HistoryReason::RoleRemoved
            && record.receiver().receiver_id == "carol"
            && record.refs().role_suite_id.as_deref() == Some(suite_id.as_str())
    }));
}

#[tokio::test]
async fn suite_delete_removes_assignments_and_records_history() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();

    let suite = suite("finance-pack", Vec::new());
    let suite_id = suite.role_suite_id().to_owned();
    let suite_etag = suite.etag().clone();
    store
        .insert_suite(org, suite)
        .await
        .unwrap_or_else(|_| unreachable!());
    AssignmentRepository::insert(
        &store,
        org,
        Assignment::new(
            AssignmentTarget::Suite(suite_id.clone()),
            user("bob"),
            GrantedVia::Manual,
        ),
    )
    .await
    .unwrap_or_else(|_| unreachable!());

    let outcome = store
        .delete_suite(org, &suite_id, &suite_etag, "admin")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(outcome.removed_assignments.len(), 1);
    assert_eq!(outcome.history.len(), 1);
    assert_eq!(outcome.history[0].reason(), HistoryReason::SuiteDeleted);

    let assignments = AssignmentRepository::list(&store, org)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(assignments.is_empty());
}

#[tokio::test]
async fn entitlement_delete_detaches_roles_and_records_per_receiver() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();

    let member = entitlement("invoice-approve");
    let entitlement_id = member.entitlement_id().to_owned();
    let entitlement_etag = member.etag().clone();
    EntitlementRepository::insert(&store, org, member.clone())
        .await
        .unwrap_or_else(|_| unreachable!());

    let role = role("accounting", vec![member]);
    let role_id = role.role_id().to_owned();
    store
        .insert_role(org, role)
        .await
        .unwrap_or_else(|_| unreachable!());

    AssignmentRepository::insert(&store, org, role_assignment(&role_id, user("bob")))
        .await
        .unwrap_or_else(|_| unreachable!());

    let outcome = store
        .delete(org, &entitlement_id, &entitlement_etag, "admin")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(outcome.detached_role_ids, vec![role_id.clone()]);
    assert_eq!(outcome.history.len(), 1);
    assert_eq!(
        outcome.history[0].reason(),
        HistoryReason::EntitlementDeleted
    );

    match store
        .find_role(org, &role_id)
        .await
        .unwrap_or_else(|_| unreachable!())
    {
        Some(stripped) => assert!(stripped.entitlements().is_empty()),
        None => unreachable!(),
    }
    let gone = EntitlementRepository::find(&store, org, &entitlement_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(gone.is_none());
}

#[tokio::test]
async fn concurrent_transitions_decide_exactly_once() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();

    let request = grant_request("alice", user("bob"));
    let expected = request.etag().clone();
    RequestRepository::insert(&store, org, request.clone())
        .await
        .unwrap_or_else(|_| unreachable!());

    let mut approved = request.clone();
    approved.approve("carol").unwrap_or_else(|_| unreachable!());
    let mut rejected = request;
    rejected.reject("dave").unwrap_or_else(|_| unreachable!());

    let first = tokio::spawn({
        let store = store.clone();
        let expected = expected.clone();
        async move { store.transition(org, approved, &expected).await }
    });
    let second = tokio::spawn({
        let store = store.clone();
        let expected = expected.clone();
        async move { store.transition(org, rejected, &expected).await }
    });

    let outcomes = [
        first.await.unwrap_or_else(|_| unreachable!()),
        second.await.unwrap_or_else(|_| unreachable!()),
    ];
    let wins = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(outcomes
        .iter()
        .any(|outcome| matches!(outcome, Err(AppError::Conflict(_)))));
}

#[tokio::test]
async fn request_list_filters_and_orders_newest_first() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();

    let older = grant_request("alice", user("bob"));
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = AccessRequest::new(
        RequestKind::Revoke,
        "alice",
        user("bob"),
        AssignmentTarget::Role("role-1".to_owned()),
        None,
        None,
    )
    .unwrap_or_else(|_| unreachable!());

    RequestRepository::insert(&store, org, older.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    RequestRepository::insert(&store, org, newer.clone())
        .await
        .unwrap_or_else(|_| unreachable!());

    let all = RequestRepository::list(&store, org, RequestQuery::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].request_id(), newer.request_id());

    let revokes = RequestRepository::list(
        &store,
        org,
        RequestQuery {
            kind: Some(RequestKind::Revoke),
            ..RequestQuery::default()
        },
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(revokes.len(), 1);
    assert_eq!(revokes[0].request_id(), newer.request_id());
}

#[tokio::test]
async fn history_list_filters_by_receiver_and_refs() {
    let store = InMemoryAuthzRepository::new();
    let org = OrgId::new();

    store
        .append(
            org,
            HistoryRecord::new(
                HistoryReason::ManualGranted,
                user("bob"),
                HistoryRefs {
                    role_id: Some("role-1".to_owned()),
                    ..HistoryRefs::default()
                },
                Some("admin".to_owned()),
                None,
            ),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    store
        .append(
            org,
            HistoryRecord::new(
                HistoryReason::ManualGranted,
                user("carol"),
                HistoryRefs {
                    role_id: Some("role-2".to_owned()),
                    ..HistoryRefs::default()
                },
                Some("admin".to_owned()),
                None,
            ),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let for_bob = HistoryRepository::list(
        &store,
        org,
        HistoryQuery {
            receiver_id: Some("bob".to_owned()),
            ..HistoryQuery::default()
        },
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(for_bob.len(), 1);
    assert_eq!(for_bob[0].receiver().receiver_id, "bob");

    let for_role = HistoryRepository::list(
        &store,
        org,
        HistoryQuery {
            role_id: Some("role-2".to_owned()),
            ..HistoryQuery::default()
        },
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(for_role.len(), 1);
    assert_eq!(for_role[0].receiver().receiver_id, "carol");
}
