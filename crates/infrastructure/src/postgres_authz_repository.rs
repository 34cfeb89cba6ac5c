use entiva_core::{AppError, AppResult, OrgId};
use entiva_domain::HistoryRecord;
use sqlx::{PgConnection, PgPool};

mod assignment;
mod catalog;
mod entitlement;
mod history;
mod request;
mod role;

/// Page size applied when a query asks for no explicit limit.
const DEFAULT_PAGE_SIZE: usize = 100;

/// PostgreSQL-backed store implementing every lifecycle repository port.
///
/// Cascading deletes and compare-and-swap transitions run inside a single
/// database transaction, so their repository-level guarantees hold under
/// concurrent callers.
#[derive(Clone)]
pub struct PostgresAuthzRepository {
    pool: PgPool,
}

impl PostgresAuthzRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn internal(context: &str, error: sqlx::Error) -> AppError {
    AppError::Internal(format!("failed to {context}: {error}"))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

async fn append_history(
    connection: &mut PgConnection,
    org_id: OrgId,
    record: &HistoryRecord,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO permission_history (
            org_id, id, effect, reason, receiver_type, receiver_id,
            entitlement_id, role_id, role_suite_id,
            grant_request_id, revoke_request_id,
            approver_id, metadata, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(org_id.as_uuid())
    .bind(record.history_id())
    .bind(record.effect().as_str())
    .bind(record.reason().as_str())
    .bind(record.receiver().receiver_type.as_str())
    .bind(record.receiver().receiver_id.as_str())
    .bind(record.refs().entitlement_id.as_deref())
    .bind(record.refs().role_id.as_deref())
    .bind(record.refs().role_suite_id.as_deref())
    .bind(record.refs().grant_request_id.as_deref())
    .bind(record.refs().revoke_request_id.as_deref())
    .bind(record.approver_id())
    .bind(record.metadata())
    .bind(record.created_at())
    .execute(connection)
    .await
    .map_err(|error| internal("append history record", error))?;

    Ok(())
}

fn page(limit: usize, offset: usize) -> (i64, i64) {
    let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
    (
        i64::try_from(limit).unwrap_or(i64::MAX),
        i64::try_from(offset).unwrap_or(i64::MAX),
    )
}
