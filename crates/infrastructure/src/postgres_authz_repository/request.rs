use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use entiva_application::{RequestQuery, RequestRepository};
use entiva_core::{AppError, AppResult, Etag, OrgId};
use entiva_domain::{
    AccessRequest, AssignmentTarget, Receiver, ReceiverType, RequestKind, RequestStatus,
};

use super::{PostgresAuthzRepository, internal, page};

#[derive(Debug, FromRow)]
struct RequestRow {
    id: String,
    kind: String,
    requestor_id: String,
    receiver_type: String,
    receiver_id: String,
    target_type: String,
    target_id: String,
    comment: Option<String>,
    attachment_url: Option<String>,
    status: String,
    decided_by: Option<String>,
    etag: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestRow {
    fn into_domain(self) -> AppResult<AccessRequest> {
        AccessRequest::restore(
            self.id,
            RequestKind::from_str(self.kind.as_str())?,
            self.requestor_id,
            Receiver::new(
                ReceiverType::from_str(self.receiver_type.as_str())?,
                self.receiver_id,
            )?,
            AssignmentTarget::from_parts(self.target_type.as_str(), self.target_id)?,
            self.comment,
            self.attachment_url,
            RequestStatus::from_str(self.status.as_str())?,
            self.decided_by,
            Etag::from_value(self.etag)?,
            self.created_at,
            self.updated_at,
        )
    }
}

const REQUEST_COLUMNS: &str = "id, kind, requestor_id, receiver_type, receiver_id, \
    target_type, target_id, comment, attachment_url, status, decided_by, \
    etag, created_at, updated_at";

#[async_trait]
impl RequestRepository for PostgresAuthzRepository {
    async fn insert(&self, org_id: OrgId, request: AccessRequest) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_requests (
                org_id, id, kind, requestor_id, receiver_type, receiver_id,
                target_type, target_id, comment, attachment_url,
                status, decided_by, etag, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(request.request_id())
        .bind(request.kind().as_str())
        .bind(request.requestor_id().as_str())
        .bind(request.receiver().receiver_type.as_str())
        .bind(request.receiver().receiver_id.as_str())
        .bind(request.target().target_type())
        .bind(request.target().target_id())
        .bind(request.comment())
        .bind(request.attachment_url())
        .bind(request.status().as_str())
        .bind(request.decided_by())
        .bind(request.etag().as_str())
        .bind(request.created_at())
        .bind(request.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| internal("insert request", error))?;

        Ok(())
    }

    async fn find(&self, org_id: OrgId, request_id: &str) -> AppResult<Option<AccessRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM access_requests WHERE org_id = $1 AND id = $2"
        ))
        .bind(org_id.as_uuid())
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("load request", error))?;

        row.map(RequestRow::into_domain).transpose()
    }

    async fn list(&self, org_id: OrgId, query: RequestQuery) -> AppResult<Vec<AccessRequest>> {
        let (limit, offset) = page(query.limit, query.offset);
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM access_requests
            WHERE org_id = $1
                AND ($2::text IS NULL OR kind = $2)
                AND ($3::text IS NULL OR status = $3)
                AND ($4::text IS NULL OR receiver_id = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(org_id.as_uuid())
        .bind(query.kind.map(|kind| kind.as_str()))
        .bind(query.status.map(|status| status.as_str()))
        .bind(query.receiver_id.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list requests", error))?;

        rows.into_iter().map(RequestRow::into_domain).collect()
    }

    async fn transition(
        &self,
        org_id: OrgId,
        request: AccessRequest,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE access_requests SET
                status = $4,
                decided_by = $5,
                etag = $6,
                updated_at = $7
            WHERE org_id = $1 AND id = $2 AND etag = $3 AND status = 'pending'
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(request.request_id())
        .bind(expected_etag.as_str())
        .bind(request.status().as_str())
        .bind(request.decided_by())
        .bind(request.etag().as_str())
        .bind(request.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| internal("transition request", error))?;

        if result.rows_affected() == 0 {
            let exists: Option<i32> = sqlx::query_scalar(
                "SELECT 1 FROM access_requests WHERE org_id = $1 AND id = $2",
            )
            .bind(org_id.as_uuid())
            .bind(request.request_id())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| internal("check request existence", error))?;

            return Err(match exists {
                Some(_) => AppError::Conflict(format!(
                    "request '{}' was already decided",
                    request.request_id()
                )),
                None => AppError::NotFound(format!(
                    "request '{}' does not exist",
                    request.request_id()
                )),
            });
        }

        Ok(())
    }
}
