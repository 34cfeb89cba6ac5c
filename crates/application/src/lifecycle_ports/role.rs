use async_trait::async_trait;

use entiva_core::{AppResult, Etag, OrgId};
use entiva_domain::{
    Assignment, HistoryRecord, OwnerType, RequestPolicy, RoleDefinition, RoleSuiteDefinition,
};

/// Input payload for creating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name.
    pub name: String,
    /// Owner kind.
    pub owner_type: OwnerType,
    /// Owner reference.
    pub owner_ref: String,
    /// Request-policy flags.
    pub policy: RequestPolicy,
    /// Entitlement ids to bundle.
    pub entitlement_ids: Vec<String>,
}

/// Input payload for updating a role's name and policy flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name.
    pub name: String,
    /// New request-policy flags.
    pub policy: RequestPolicy,
}

/// Input payload for creating a role suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleSuiteInput {
    /// Suite name.
    pub name: String,
    /// Owner kind.
    pub owner_type: OwnerType,
    /// Owner reference.
    pub owner_ref: String,
    /// Request-policy flags.
    pub policy: RequestPolicy,
    /// Member role ids.
    pub role_ids: Vec<String>,
}

/// Input payload for updating a role suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoleSuiteInput {
    /// New suite name.
    pub name: String,
    /// New request-policy flags.
    pub policy: RequestPolicy,
    /// Replacement member role ids.
    pub role_ids: Vec<String>,
}

/// Result of a role-delete cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDeleteOutcome {
    /// The deleted role.
    pub role: RoleDefinition,
    /// Suites the role was detached from.
    pub detached_suite_ids: Vec<String>,
    /// Assignments removed because they targeted the role.
    pub removed_assignments: Vec<Assignment>,
    /// History records appended inside the cascade commit.
    pub history: Vec<HistoryRecord>,
}

/// Result of a suite-delete cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteDeleteOutcome {
    /// The deleted suite.
    pub suite: RoleSuiteDefinition,
    /// Assignments removed because they targeted the suite.
    pub removed_assignments: Vec<Assignment>,
    /// History records appended inside the cascade commit.
    pub history: Vec<HistoryRecord>,
}

/// Repository port for roles and role suites.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role; duplicate name fails with `AlreadyExists`.
    async fn insert_role(&self, org_id: OrgId, role: RoleDefinition) -> AppResult<()>;

    /// Lists roles ordered by name.
    async fn list_roles(&self, org_id: OrgId) -> AppResult<Vec<RoleDefinition>>;

    /// Finds a role by id.
    async fn find_role(&self, org_id: OrgId, role_id: &str) -> AppResult<Option<RoleDefinition>>;

    /// Saves a mutated role; the stored etag must equal `expected_etag`.
    async fn save_role(
        &self,
        org_id: OrgId,
        role: RoleDefinition,
        expected_etag: &Etag,
    ) -> AppResult<()>;

    /// Deletes a role under an etag guard, cascading in the same commit:
    /// the role is detached from every suite, assignments targeting it are
    /// removed, and history records (`ROLE_DELETED` per assigned receiver,
    /// `ROLE_REMOVED` per receiver holding an affected suite) are appended,
    /// attributed to `actor_id`.
    async fn delete_role(
        &self,
        org_id: OrgId,
        role_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<RoleDeleteOutcome>;

    /// Persists a new suite; duplicate name fails with `AlreadyExists`.
    async fn insert_suite(&self, org_id: OrgId, suite: RoleSuiteDefinition) -> AppResult<()>;

    /// Lists suites ordered by name.
    async fn list_suites(&self, org_id: OrgId) -> AppResult<Vec<RoleSuiteDefinition>>;

    /// Finds a suite by id.
    async fn find_suite(
        &self,
        org_id: OrgId,
        role_suite_id: &str,
    ) -> AppResult<Option<RoleSuiteDefinition>>;

    /// Saves a mutated suite; the stored etag must equal `expected_etag`.
    async fn save_suite(
        &self,
        org_id: OrgId,
        suite: RoleSuiteDefinition,
        expected_etag: &Etag,
    ) -> AppResult<()>;

    /// Deletes a suite under an etag guard, removing its assignments and
    /// appending `SUITE_DELETED` history per assigned receiver in the same
    /// commit, attributed to `actor_id`.
    async fn delete_suite(
        &self,
        org_id: OrgId,
        role_suite_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<SuiteDeleteOutcome>;

    /// Lists suites containing the given role.
    async fn list_suites_containing_role(
        &self,
        org_id: OrgId,
        role_id: &str,
    ) -> AppResult<Vec<RoleSuiteDefinition>>;
}
