use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};

use entiva_application::AssignmentRepository;
use entiva_core::{AppResult, OrgId};
use entiva_domain::{Assignment, AssignmentTarget, GrantedVia, Receiver, ReceiverType};

use super::{PostgresAuthzRepository, internal, is_unique_violation};

#[derive(Debug, FromRow)]
pub(super) struct AssignmentRow {
    pub(super) target_type: String,
    pub(super) target_id: String,
    pub(super) receiver_type: String,
    pub(super) receiver_id: String,
    pub(super) granted_via: String,
    pub(super) created_at: DateTime<Utc>,
}

impl AssignmentRow {
    pub(super) fn into_domain(self) -> AppResult<Assignment> {
        Ok(Assignment::restore(
            AssignmentTarget::from_parts(self.target_type.as_str(), self.target_id)?,
            Receiver::new(
                ReceiverType::from_str(self.receiver_type.as_str())?,
                self.receiver_id,
            )?,
            GrantedVia::from_str(self.granted_via.as_str())?,
            self.created_at,
        ))
    }
}

pub(super) async fn fetch_assignments_for_target(
    connection: &mut PgConnection,
    org_id: OrgId,
    target_type: &str,
    target_id: &str,
) -> AppResult<Vec<Assignment>> {
    let rows = sqlx::query_as::<_, AssignmentRow>(
        r#"
        SELECT target_type, target_id, receiver_type, receiver_id, granted_via, created_at
        FROM assignments
        WHERE org_id = $1 AND target_type = $2 AND target_id = $3
        "#,
    )
    .bind(org_id.as_uuid())
    .bind(target_type)
    .bind(target_id)
    .fetch_all(connection)
    .await
    .map_err(|error| internal("list assignments for target", error))?;

    rows.into_iter().map(AssignmentRow::into_domain).collect()
}

#[async_trait]
impl AssignmentRepository for PostgresAuthzRepository {
    async fn insert(&self, org_id: OrgId, assignment: Assignment) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO assignments (
                org_id, target_type, target_id, receiver_type, receiver_id,
                granted_via, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(assignment.target().target_type())
        .bind(assignment.target().target_id())
        .bind(assignment.receiver().receiver_type.as_str())
        .bind(assignment.receiver().receiver_id.as_str())
        .bind(assignment.granted_via().as_str())
        .bind(assignment.created_at())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(error) if is_unique_violation(&error) => Ok(false),
            Err(error) => Err(internal("insert assignment", error)),
        }
    }

    async fn remove(
        &self,
        org_id: OrgId,
        target: &AssignmentTarget,
        receiver: &Receiver,
    ) -> AppResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            DELETE FROM assignments
            WHERE org_id = $1 AND target_type = $2 AND target_id = $3
                AND receiver_type = $4 AND receiver_id = $5
            RETURNING target_type, target_id, receiver_type, receiver_id,
                      granted_via, created_at
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(target.target_type())
        .bind(target.target_id())
        .bind(receiver.receiver_type.as_str())
        .bind(receiver.receiver_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("remove assignment", error))?;

        row.map(AssignmentRow::into_domain).transpose()
    }

    async fn list(&self, org_id: OrgId) -> AppResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT target_type, target_id, receiver_type, receiver_id, granted_via, created_at
            FROM assignments
            WHERE org_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list assignments", error))?;

        rows.into_iter().map(AssignmentRow::into_domain).collect()
    }

    async fn list_for_receivers(
        &self,
        org_id: OrgId,
        receivers: &[Receiver],
    ) -> AppResult<Vec<Assignment>> {
        // A receiver key is (type, id); two parallel arrays keep the lookup
        // a single round trip.
        let types: Vec<&str> = receivers
            .iter()
            .map(|receiver| receiver.receiver_type.as_str())
            .collect();
        let ids: Vec<&str> = receivers
            .iter()
            .map(|receiver| receiver.receiver_id.as_str())
            .collect();

        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT assignments.target_type, assignments.target_id,
                   assignments.receiver_type, assignments.receiver_id,
                   assignments.granted_via, assignments.created_at
            FROM assignments
            INNER JOIN UNNEST($2::text[], $3::text[]) AS wanted(receiver_type, receiver_id)
                ON wanted.receiver_type = assignments.receiver_type
                AND wanted.receiver_id = assignments.receiver_id
            WHERE assignments.org_id = $1
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(&types)
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list assignments for receivers", error))?;

        rows.into_iter().map(AssignmentRow::into_domain).collect()
    }

    async fn list_for_target(
        &self,
        org_id: OrgId,
        target: &AssignmentTarget,
    ) -> AppResult<Vec<Assignment>> {
        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| internal("acquire connection", error))?;
        fetch_assignments_for_target(&mut connection, org_id, target.target_type(), target.target_id())
            .await
    }
}
