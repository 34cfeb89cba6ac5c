use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use entiva_core::OrgId;
use entiva_domain::{
    AccessRequest, ActionDefinition, Assignment, AssignmentTarget, Entitlement, HistoryRecord,
    ResourceDefinition, RoleDefinition, RoleSuiteDefinition,
};

mod assignment;
mod catalog;
mod entitlement;
mod history;
mod request;
mod role;
#[cfg(test)]
mod tests;

/// Page size applied when a query asks for no explicit limit.
const DEFAULT_PAGE_SIZE: usize = 100;

fn paginate<T>(items: Vec<T>, limit: usize, offset: usize) -> Vec<T> {
    let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
    items.into_iter().skip(offset).take(limit).collect()
}

#[derive(Default)]
struct State {
    resources: HashMap<(OrgId, String), ResourceDefinition>,
    actions: HashMap<(OrgId, String), ActionDefinition>,
    entitlements: HashMap<(OrgId, String), Entitlement>,
    roles: HashMap<(OrgId, String), RoleDefinition>,
    suites: HashMap<(OrgId, String), RoleSuiteDefinition>,
    assignments: Vec<(OrgId, Assignment)>,
    requests: HashMap<(OrgId, String), AccessRequest>,
    history: Vec<(OrgId, HistoryRecord)>,
}

impl State {
    fn receivers_assigned_to(&self, org_id: OrgId, target: &AssignmentTarget) -> Vec<Assignment> {
        self.assignments
            .iter()
            .filter(|(org, assignment)| *org == org_id && assignment.target() == target)
            .map(|(_, assignment)| assignment.clone())
            .collect()
    }
}

/// In-memory store implementing every lifecycle repository port.
///
/// One write lock covers the whole state, so each cascade (role delete, suite
/// delete, entitlement delete) and each compare-and-swap transition commits
/// atomically, mirroring the single-transaction guarantee of the Postgres
/// adapter. Intended for tests and local development.
#[derive(Clone, Default)]
pub struct InMemoryAuthzRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryAuthzRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
