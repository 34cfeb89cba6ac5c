use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};

use entiva_application::{RoleDeleteOutcome, RoleRepository, SuiteDeleteOutcome};
use entiva_core::{AppError, AppResult, Etag, OrgId};
use entiva_domain::{
    ActionSelector, Entitlement, HistoryReason, HistoryRecord, HistoryRefs, OwnerType,
    RequestPolicy, ResourceSelector, RoleDefinition, RoleSuiteDefinition, Scope,
};

use super::assignment::fetch_assignments_for_target;
use super::{PostgresAuthzRepository, append_history, internal, is_unique_violation};

#[derive(Debug, FromRow)]
struct RoleRow {
    id: String,
    name: String,
    owner_type: String,
    owner_ref: String,
    is_requestable: bool,
    is_required_attachment: bool,
    is_required_comment: bool,
    etag: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_domain(self, entitlements: Vec<Entitlement>) -> AppResult<RoleDefinition> {
        RoleDefinition::restore(
            self.id,
            self.name,
            OwnerType::from_str(self.owner_type.as_str())?,
            self.owner_ref,
            RequestPolicy {
                is_requestable: self.is_requestable,
                is_required_attachment: self.is_required_attachment,
                is_required_comment: self.is_required_comment,
            },
            entitlements,
            Etag::from_value(self.etag)?,
            self.created_at,
            self.updated_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct SuiteRow {
    id: String,
    name: String,
    owner_type: String,
    owner_ref: String,
    is_requestable: bool,
    is_required_attachment: bool,
    is_required_comment: bool,
    etag: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SuiteRow {
    fn into_domain(self, role_ids: Vec<String>) -> AppResult<RoleSuiteDefinition> {
        RoleSuiteDefinition::restore(
            self.id,
            self.name,
            OwnerType::from_str(self.owner_type.as_str())?,
            self.owner_ref,
            RequestPolicy {
                is_requestable: self.is_requestable,
                is_required_attachment: self.is_required_attachment,
                is_required_comment: self.is_required_comment,
            },
            role_ids,
            Etag::from_value(self.etag)?,
            self.created_at,
            self.updated_at,
        )
    }
}

/// One role-membership row joined with its base entitlement.
#[derive(Debug, FromRow)]
struct MemberRow {
    role_id: String,
    member_scope_ref: String,
    id: String,
    name: String,
    resource_selector: String,
    action_selector: String,
    etag: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRow {
    fn into_domain(self) -> AppResult<Entitlement> {
        Entitlement::restore(
            self.id,
            self.name,
            ResourceSelector::from_storage_value(self.resource_selector.as_str())?,
            ActionSelector::from_storage_value(self.action_selector.as_str())?,
            Scope::from_ref(Some(self.member_scope_ref))?,
            Etag::from_value(self.etag)?,
            self.created_at,
            self.updated_at,
        )
    }
}

const ROLE_COLUMNS: &str = "id, name, owner_type, owner_ref, is_requestable, \
    is_required_attachment, is_required_comment, etag, created_at, updated_at";

const MEMBER_QUERY: &str = r#"
    SELECT members.role_id,
           members.scope_ref AS member_scope_ref,
           entitlements.id, entitlements.name,
           entitlements.resource_selector, entitlements.action_selector,
           entitlements.etag, entitlements.created_at, entitlements.updated_at
    FROM role_entitlements AS members
    INNER JOIN entitlements
        ON entitlements.org_id = members.org_id
        AND entitlements.id = members.entitlement_id
    WHERE members.org_id = $1
"#;

async fn load_members_by_role(
    connection: &mut PgConnection,
    org_id: OrgId,
) -> AppResult<HashMap<String, Vec<Entitlement>>> {
    let rows = sqlx::query_as::<_, MemberRow>(&format!("{MEMBER_QUERY} ORDER BY members.position"))
        .bind(org_id.as_uuid())
        .fetch_all(connection)
        .await
        .map_err(|error| internal("list role memberships", error))?;

    let mut by_role: HashMap<String, Vec<Entitlement>> = HashMap::new();
    for row in rows {
        let role_id = row.role_id.clone();
        by_role.entry(role_id).or_default().push(row.into_domain()?);
    }

    Ok(by_role)
}

async fn load_role_members(
    connection: &mut PgConnection,
    org_id: OrgId,
    role_id: &str,
) -> AppResult<Vec<Entitlement>> {
    let rows = sqlx::query_as::<_, MemberRow>(&format!(
        "{MEMBER_QUERY} AND members.role_id = $2 ORDER BY members.position"
    ))
    .bind(org_id.as_uuid())
    .bind(role_id)
    .fetch_all(connection)
    .await
    .map_err(|error| internal("list role membership", error))?;

    rows.into_iter().map(MemberRow::into_domain).collect()
}

async fn replace_role_members(
    connection: &mut PgConnection,
    org_id: OrgId,
    role: &RoleDefinition,
) -> AppResult<()> {
    sqlx::query("DELETE FROM role_entitlements WHERE org_id = $1 AND role_id = $2")
        .bind(org_id.as_uuid())
        .bind(role.role_id())
        .execute(&mut *connection)
        .await
        .map_err(|error| internal("clear role membership", error))?;

    for (position, entitlement) in role.entitlements().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO role_entitlements (org_id, role_id, entitlement_id, scope_ref, position)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(role.role_id())
        .bind(entitlement.entitlement_id())
        .bind(entitlement.scope().as_ref_value().unwrap_or(""))
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut *connection)
        .await
        .map_err(|error| internal("insert role membership", error))?;
    }

    Ok(())
}

async fn load_suite_roles(
    connection: &mut PgConnection,
    org_id: OrgId,
    role_suite_id: &str,
) -> AppResult<Vec<String>> {
    sqlx::query_scalar(
        r#"
        SELECT role_id FROM role_suite_members
        WHERE org_id = $1 AND role_suite_id = $2
        ORDER BY position
        "#,
    )
    .bind(org_id.as_uuid())
    .bind(role_suite_id)
    .fetch_all(connection)
    .await
    .map_err(|error| internal("list suite membership", error))
}

async fn replace_suite_roles(
    connection: &mut PgConnection,
    org_id: OrgId,
    suite: &RoleSuiteDefinition,
) -> AppResult<()> {
    sqlx::query("DELETE FROM role_suite_members WHERE org_id = $1 AND role_suite_id = $2")
        .bind(org_id.as_uuid())
        .bind(suite.role_suite_id())
        .execute(&mut *connection)
        .await
        .map_err(|error| internal("clear suite membership", error))?;

    for (position, role_id) in suite.role_ids().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO role_suite_members (org_id, role_suite_id, role_id, position)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(suite.role_suite_id())
        .bind(role_id)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut *connection)
        .await
        .map_err(|error| internal("insert suite membership", error))?;
    }

    Ok(())
}

#[async_trait]
impl RoleRepository for PostgresAuthzRepository {
    async fn insert_role(&self, org_id: OrgId, role: RoleDefinition) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("open role insert transaction", error))?;

        sqlx::query(
            r#"
            INSERT INTO roles (
                org_id, id, name, owner_type, owner_ref,
                is_requestable, is_required_attachment, is_required_comment,
                etag, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(role.role_id())
        .bind(role.name().as_str())
        .bind(role.owner_type().as_str())
        .bind(role.owner_ref().as_str())
        .bind(role.policy().is_requestable)
        .bind(role.policy().is_required_attachment)
        .bind(role.policy().is_required_comment)
        .bind(role.etag().as_str())
        .bind(role.created_at())
        .bind(role.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::AlreadyExists(format!(
                    "role name '{}' is already taken",
                    role.name()
                ))
            } else {
                internal("insert role", error)
            }
        })?;

        replace_role_members(&mut *transaction, org_id, &role).await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("commit role insert", error))?;
        Ok(())
    }

    async fn list_roles(&self, org_id: OrgId) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE org_id = $1 ORDER BY name"
        ))
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list roles", error))?;

        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| internal("acquire connection", error))?;
        let mut members = load_members_by_role(&mut connection, org_id).await?;

        rows.into_iter()
            .map(|row| {
                let entitlements = members.remove(row.id.as_str()).unwrap_or_default();
                row.into_domain(entitlements)
            })
            .collect()
    }

    async fn find_role(&self, org_id: OrgId, role_id: &str) -> AppResult<Option<RoleDefinition>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE org_id = $1 AND id = $2"
        ))
        .bind(org_id.as_uuid())
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("load role", error))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| internal("acquire connection", error))?;
        let entitlements = load_role_members(&mut connection, org_id, role_id).await?;
        row.into_domain(entitlements).map(Some)
    }

    async fn save_role(
        &self,
        org_id: OrgId,
        role: RoleDefinition,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("open role save transaction", error))?;

        let result = sqlx::query(
            r#"
            UPDATE roles SET
                name = $4,
                is_requestable = $5,
                is_required_attachment = $6,
                is_required_comment = $7,
                etag = $8,
                updated_at = $9
            WHERE org_id = $1 AND id = $2 AND etag = $3
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(role.role_id())
        .bind(expected_etag.as_str())
        .bind(role.name().as_str())
        .bind(role.policy().is_requestable)
        .bind(role.policy().is_required_attachment)
        .bind(role.policy().is_required_comment)
        .bind(role.etag().as_str())
        .bind(role.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::AlreadyExists(format!(
                    "role name '{}' is already taken",
                    role.name()
                ))
            } else {
                internal("save role", error)
            }
        })?;

        if result.rows_affected() == 0 {
            let exists: Option<i32> =
                sqlx::query_scalar("SELECT 1 FROM roles WHERE org_id = $1 AND id = $2")
                    .bind(org_id.as_uuid())
                    .bind(role.role_id())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(|error| internal("check role existence", error))?;

            return Err(match exists {
                Some(_) => AppError::Conflict(format!(
                    "role '{}' was modified concurrently",
                    role.role_id()
                )),
                None => {
                    AppError::NotFound(format!("role '{}' does not exist", role.role_id()))
                }
            });
        }

        replace_role_members(&mut *transaction, org_id, &role).await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("commit role save", error))?;
        Ok(())
    }

    async fn delete_role(
        &self,
        org_id: OrgId,
        role_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<RoleDeleteOutcome> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("open role delete transaction", error))?;

        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE org_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(org_id.as_uuid())
        .bind(role_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| internal("load role for delete", error))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        let entitlements = load_role_members(&mut *transaction, org_id, role_id).await?;
        let role = row.into_domain(entitlements)?;
        if !role.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' was modified concurrently"
            )));
        }

        let detached_suite_ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT role_suite_id FROM role_suite_members
            WHERE org_id = $1 AND role_id = $2
            ORDER BY role_suite_id
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(role_id)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| internal("list suites containing role", error))?;

        sqlx::query("DELETE FROM role_suite_members WHERE org_id = $1 AND role_id = $2")
            .bind(org_id.as_uuid())
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("detach role from suites", error))?;

        for suite_id in &detached_suite_ids {
            sqlx::query(
                r#"
                UPDATE role_suites SET etag = $3, updated_at = now()
                WHERE org_id = $1 AND id = $2
                "#,
            )
            .bind(org_id.as_uuid())
            .bind(suite_id)
            .bind(Etag::new().as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("rotate suite etag", error))?;
        }

        let removed_assignments =
            fetch_assignments_for_target(&mut *transaction, org_id, "role", role_id).await?;
        sqlx::query(
            "DELETE FROM assignments WHERE org_id = $1 AND target_type = 'role' AND target_id = $2",
        )
        .bind(org_id.as_uuid())
        .bind(role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| internal("remove role assignments", error))?;

        let mut history = Vec::new();
        for assignment in &removed_assignments {
            history.push(HistoryRecord::new(
                HistoryReason::RoleDeleted,
                assignment.receiver().clone(),
                HistoryRefs {
                    role_id: Some(role_id.to_owned()),
                    ..HistoryRefs::default()
                },
                Some(actor_id.to_owned()),
                None,
            ));
        }
        for suite_id in &detached_suite_ids {
            let suite_assignments =
                fetch_assignments_for_target(&mut *transaction, org_id, "suite", suite_id).await?;
            for assignment in suite_assignments {
                history.push(HistoryRecord::new(
                    HistoryReason::RoleRemoved,
                    assignment.receiver().clone(),
                    HistoryRefs {
                        role_id: Some(role_id.to_owned()),
                        role_suite_id: Some(suite_id.clone()),
                        ..HistoryRefs::default()
                    },
                    Some(actor_id.to_owned()),
                    None,
                ));
            }
        }

        sqlx::query("DELETE FROM role_entitlements WHERE org_id = $1 AND role_id = $2")
            .bind(org_id.as_uuid())
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("clear role membership", error))?;

        sqlx::query("DELETE FROM roles WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("delete role", error))?;

        for record in &history {
            append_history(&mut *transaction, org_id, record).await?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| internal("commit role delete", error))?;

        Ok(RoleDeleteOutcome {
            role,
            detached_suite_ids,
            removed_assignments,
            history,
        })
    }

    async fn insert_suite(&self, org_id: OrgId, suite: RoleSuiteDefinition) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("open suite insert transaction", error))?;

        sqlx::query(
            r#"
            INSERT INTO role_suites (
                org_id, id, name, owner_type, owner_ref,
                is_requestable, is_required_attachment, is_required_comment,
                etag, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(suite.role_suite_id())
        .bind(suite.name().as_str())
        .bind(suite.owner_type().as_str())
        .bind(suite.owner_ref().as_str())
        .bind(suite.policy().is_requestable)
        .bind(suite.policy().is_required_attachment)
        .bind(suite.policy().is_required_comment)
        .bind(suite.etag().as_str())
        .bind(suite.created_at())
        .bind(suite.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::AlreadyExists(format!(
                    "role suite name '{}' is already taken",
                    suite.name()
                ))
            } else {
                internal("insert suite", error)
            }
        })?;

        replace_suite_roles(&mut *transaction, org_id, &suite).await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("commit suite insert", error))?;
        Ok(())
    }

    async fn list_suites(&self, org_id: OrgId) -> AppResult<Vec<RoleSuiteDefinition>> {
        let rows = sqlx::query_as::<_, SuiteRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM role_suites WHERE org_id = $1 ORDER BY name"
        ))
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list suites", error))?;

        #[derive(Debug, FromRow)]
        struct SuiteMemberRow {
            role_suite_id: String,
            role_id: String,
        }

        let member_rows = sqlx::query_as::<_, SuiteMemberRow>(
            r#"
            SELECT role_suite_id, role_id FROM role_suite_members
            WHERE org_id = $1
            ORDER BY position
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list suite memberships", error))?;

        let mut members: HashMap<String, Vec<String>> = HashMap::new();
        for member in member_rows {
            members
                .entry(member.role_suite_id)
                .or_default()
                .push(member.role_id);
        }

        rows.into_iter()
            .map(|row| {
                let role_ids = members.remove(row.id.as_str()).unwrap_or_default();
                row.into_domain(role_ids)
            })
            .collect()
    }

    async fn find_suite(
        &self,
        org_id: OrgId,
        role_suite_id: &str,
    ) -> AppResult<Option<RoleSuiteDefinition>> {
        let row = sqlx::query_as::<_, SuiteRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM role_suites WHERE org_id = $1 AND id = $2"
        ))
        .bind(org_id.as_uuid())
        .bind(role_suite_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("load suite", error))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| internal("acquire connection", error))?;
        let role_ids = load_suite_roles(&mut connection, org_id, role_suite_id).await?;
        row.into_domain(role_ids).map(Some)
    }

    async fn save_suite(
        &self,
        org_id: OrgId,
        suite: RoleSuiteDefinition,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("open suite save transaction", error))?;

        let result = sqlx::query(
            r#"
            UPDATE role_suites SET
                name = $4,
                is_requestable = $5,
                is_required_attachment = $6,
                is_required_comment = $7,
                etag = $8,
                updated_at = $9
            WHERE org_id = $1 AND id = $2 AND etag = $3
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(suite.role_suite_id())
        .bind(expected_etag.as_str())
        .bind(suite.name().as_str())
        .bind(suite.policy().is_requestable)
        .bind(suite.policy().is_required_attachment)
        .bind(suite.policy().is_required_comment)
        .bind(suite.etag().as_str())
        .bind(suite.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::AlreadyExists(format!(
                    "role suite name '{}' is already taken",
                    suite.name()
                ))
            } else {
                internal("save suite", error)
            }
        })?;

        if result.rows_affected() == 0 {
            let exists: Option<i32> =
                sqlx::query_scalar("SELECT 1 FROM role_suites WHERE org_id = $1 AND id = $2")
                    .bind(org_id.as_uuid())
                    .bind(suite.role_suite_id())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(|error| internal("check suite existence", error))?;

            return Err(match exists {
                Some(_) => AppError::Conflict(format!(
                    "role suite '{}' was modified concurrently",
                    suite.role_suite_id()
                )),
                None => AppError::NotFound(format!(
                    "role suite '{}' does not exist",
                    suite.role_suite_id()
                )),
            });
        }

        replace_suite_roles(&mut *transaction, org_id, &suite).await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("commit suite save", error))?;
        Ok(())
    }

    async fn delete_suite(
        &self,
        org_id: OrgId,
        role_suite_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<SuiteDeleteOutcome> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("open suite delete transaction", error))?;

        let row = sqlx::query_as::<_, SuiteRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM role_suites WHERE org_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(org_id.as_uuid())
        .bind(role_suite_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| internal("load suite for delete", error))?
        .ok_or_else(|| {
            AppError::NotFound(format!("role suite '{role_suite_id}' does not exist"))
        })?;

        let role_ids = load_suite_roles(&mut *transaction, org_id, role_suite_id).await?;
        let suite = row.into_domain(role_ids)?;
        if !suite.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "role suite '{role_suite_id}' was modified concurrently"
            )));
        }

        let removed_assignments =
            fetch_assignments_for_target(&mut *transaction, org_id, "suite", role_suite_id).await?;
        sqlx::query(
            "DELETE FROM assignments WHERE org_id = $1 AND target_type = 'suite' AND target_id = $2",
        )
        .bind(org_id.as_uuid())
        .bind(role_suite_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| internal("remove suite assignments", error))?;

        let mut history = Vec::new();
        for assignment in &removed_assignments {
            history.push(HistoryRecord::new(
                HistoryReason::SuiteDeleted,
                assignment.receiver().clone(),
                HistoryRefs {
                    role_suite_id: Some(role_suite_id.to_owned()),
                    ..HistoryRefs::default()
                },
                Some(actor_id.to_owned()),
                None,
            ));
        }

        sqlx::query("DELETE FROM role_suite_members WHERE org_id = $1 AND role_suite_id = $2")
            .bind(org_id.as_uuid())
            .bind(role_suite_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("clear suite membership", error))?;

        sqlx::query("DELETE FROM role_suites WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(role_suite_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("delete suite", error))?;

        for record in &history {
            append_history(&mut *transaction, org_id, record).await?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| internal("commit suite delete", error))?;

        Ok(SuiteDeleteOutcome {
            suite,
            removed_assignments,
            history,
        })
    }

    async fn list_suites_containing_role(
        &self,
        org_id: OrgId,
        role_id: &str,
    ) -> AppResult<Vec<RoleSuiteDefinition>> {
        let suite_ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT role_suite_id FROM role_suite_members
            WHERE org_id = $1 AND role_id = $2
            ORDER BY role_suite_id
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list suites containing role", error))?;

        let mut suites = Vec::with_capacity(suite_ids.len());
        for suite_id in suite_ids {
            if let Some(suite) = self.find_suite(org_id, suite_id.as_str()).await? {
                suites.push(suite);
            }
        }

        Ok(suites)
    }
}
