use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

use entiva_application::{HistoryQuery, HistoryRepository};
use entiva_core::{AppResult, OrgId};
use entiva_domain::{
    HistoryReason, HistoryRecord, HistoryRefs, PermissionEffect, Receiver, ReceiverType,
};

use super::{PostgresAuthzRepository, append_history, internal, page};

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: String,
    effect: String,
    reason: String,
    receiver_type: String,
    receiver_id: String,
    entitlement_id: Option<String>,
    role_id: Option<String>,
    role_suite_id: Option<String>,
    grant_request_id: Option<String>,
    revoke_request_id: Option<String>,
    approver_id: Option<String>,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_domain(self) -> AppResult<HistoryRecord> {
        HistoryRecord::restore(
            self.id,
            PermissionEffect::from_str(self.effect.as_str())?,
            HistoryReason::from_str(self.reason.as_str())?,
            Receiver::new(
                ReceiverType::from_str(self.receiver_type.as_str())?,
                self.receiver_id,
            )?,
            HistoryRefs {
                entitlement_id: self.entitlement_id,
                role_id: self.role_id,
                role_suite_id: self.role_suite_id,
                grant_request_id: self.grant_request_id,
                revoke_request_id: self.revoke_request_id,
            },
            self.approver_id,
            self.metadata,
            self.created_at,
        )
    }
}

#[async_trait]
impl HistoryRepository for PostgresAuthzRepository {
    async fn append(&self, org_id: OrgId, record: HistoryRecord) -> AppResult<()> {
        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| internal("acquire connection", error))?;
        append_history(&mut connection, org_id, &record).await
    }

    async fn list(&self, org_id: OrgId, query: HistoryQuery) -> AppResult<Vec<HistoryRecord>> {
        let (limit, offset) = page(query.limit, query.offset);
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, effect, reason, receiver_type, receiver_id,
                   entitlement_id, role_id, role_suite_id,
                   grant_request_id, revoke_request_id,
                   approver_id, metadata, created_at
            FROM permission_history
            WHERE org_id = $1
                AND ($2::text IS NULL OR receiver_id = $2)
                AND ($3::text IS NULL OR entitlement_id = $3)
                AND ($4::text IS NULL OR role_id = $4)
                AND ($5::text IS NULL OR role_suite_id = $5)
                AND ($6::text IS NULL OR grant_request_id = $6)
                AND ($7::text IS NULL OR revoke_request_id = $7)
                AND ($8::timestamptz IS NULL OR created_at >= $8)
                AND ($9::timestamptz IS NULL OR created_at <= $9)
            ORDER BY created_at DESC
            LIMIT $10 OFFSET $11
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(query.receiver_id.as_deref())
        .bind(query.entitlement_id.as_deref())
        .bind(query.role_id.as_deref())
        .bind(query.role_suite_id.as_deref())
        .bind(query.grant_request_id.as_deref())
        .bind(query.revoke_request_id.as_deref())
        .bind(query.from)
        .bind(query.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list history", error))?;

        rows.into_iter().map(HistoryRow::into_domain).collect()
    }
}
