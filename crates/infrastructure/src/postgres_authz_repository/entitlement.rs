use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use entiva_application::{EntitlementDeleteOutcome, EntitlementRepository};
use entiva_core::{AppError, AppResult, Etag, OrgId};
use entiva_domain::{
    ActionSelector, Entitlement, HistoryReason, HistoryRecord, HistoryRefs, ResourceSelector,
    Scope, WILDCARD,
};

use super::assignment::fetch_assignments_for_target;
use super::{PostgresAuthzRepository, append_history, internal};

#[derive(Debug, FromRow)]
pub(super) struct EntitlementRow {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) resource_selector: String,
    pub(super) action_selector: String,
    pub(super) scope_ref: Option<String>,
    pub(super) etag: String,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl EntitlementRow {
    pub(super) fn into_domain(self) -> AppResult<Entitlement> {
        Entitlement::restore(
            self.id,
            self.name,
            ResourceSelector::from_storage_value(self.resource_selector.as_str())?,
            ActionSelector::from_storage_value(self.action_selector.as_str())?,
            Scope::from_ref(self.scope_ref)?,
            Etag::from_value(self.etag)?,
            self.created_at,
            self.updated_at,
        )
    }
}

const ENTITLEMENT_COLUMNS: &str =
    "id, name, resource_selector, action_selector, scope_ref, etag, created_at, updated_at";

#[async_trait]
impl EntitlementRepository for PostgresAuthzRepository {
    async fn insert(&self, org_id: OrgId, entitlement: Entitlement) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO entitlements (
                org_id, id, name, resource_selector, action_selector,
                scope_ref, etag, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(entitlement.entitlement_id())
        .bind(entitlement.name().as_str())
        .bind(entitlement.resource().as_storage_value())
        .bind(entitlement.action().as_storage_value())
        .bind(entitlement.scope().as_ref_value())
        .bind(entitlement.etag().as_str())
        .bind(entitlement.created_at())
        .bind(entitlement.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| internal("insert entitlement", error))?;

        Ok(())
    }

    async fn list(&self, org_id: OrgId) -> AppResult<Vec<Entitlement>> {
        let rows = sqlx::query_as::<_, EntitlementRow>(&format!(
            "SELECT {ENTITLEMENT_COLUMNS} FROM entitlements WHERE org_id = $1 ORDER BY name"
        ))
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list entitlements", error))?;

        rows.into_iter().map(EntitlementRow::into_domain).collect()
    }

    async fn find(&self, org_id: OrgId, entitlement_id: &str) -> AppResult<Option<Entitlement>> {
        let row = sqlx::query_as::<_, EntitlementRow>(&format!(
            "SELECT {ENTITLEMENT_COLUMNS} FROM entitlements WHERE org_id = $1 AND id = $2"
        ))
        .bind(org_id.as_uuid())
        .bind(entitlement_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("load entitlement", error))?;

        row.map(EntitlementRow::into_domain).transpose()
    }

    async fn delete(
        &self,
        org_id: OrgId,
        entitlement_id: &str,
        expected_etag: &Etag,
        actor_id: &str,
    ) -> AppResult<EntitlementDeleteOutcome> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("open entitlement delete transaction", error))?;

        let row = sqlx::query_as::<_, EntitlementRow>(&format!(
            "SELECT {ENTITLEMENT_COLUMNS} FROM entitlements \
             WHERE org_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(org_id.as_uuid())
        .bind(entitlement_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| internal("load entitlement for delete", error))?
        .ok_or_else(|| {
            AppError::NotFound(format!("entitlement '{entitlement_id}' does not exist"))
        })?;

        let entitlement = row.into_domain()?;
        if !entitlement.etag().matches(expected_etag) {
            return Err(AppError::Conflict(format!(
                "entitlement '{entitlement_id}' was modified concurrently"
            )));
        }

        let detached_role_ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT role_id FROM role_entitlements
            WHERE org_id = $1 AND entitlement_id = $2
            ORDER BY role_id
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(entitlement_id)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| internal("list roles referencing entitlement", error))?;

        sqlx::query("DELETE FROM role_entitlements WHERE org_id = $1 AND entitlement_id = $2")
            .bind(org_id.as_uuid())
            .bind(entitlement_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("detach entitlement from roles", error))?;

        let mut history = Vec::new();
        for role_id in &detached_role_ids {
            sqlx::query(
                r#"
                UPDATE roles SET etag = $3, updated_at = now()
                WHERE org_id = $1 AND id = $2
                "#,
            )
            .bind(org_id.as_uuid())
            .bind(role_id)
            .bind(Etag::new().as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("rotate role etag", error))?;

            let assignments =
                fetch_assignments_for_target(&mut *transaction, org_id, "role", role_id).await?;
            for assignment in assignments {
                history.push(HistoryRecord::new(
                    HistoryReason::EntitlementDeleted,
                    assignment.receiver().clone(),
                    HistoryRefs {
                        entitlement_id: Some(entitlement_id.to_owned()),
                        role_id: Some(role_id.clone()),
                        ..HistoryRefs::default()
                    },
                    Some(actor_id.to_owned()),
                    None,
                ));
            }
        }

        sqlx::query("DELETE FROM entitlements WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(entitlement_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("delete entitlement", error))?;

        for record in &history {
            append_history(&mut *transaction, org_id, record).await?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| internal("commit entitlement delete", error))?;

        Ok(EntitlementDeleteOutcome {
            entitlement,
            detached_role_ids,
            history,
        })
    }

    async fn any_referencing_resource(&self, org_id: OrgId, resource_id: &str) -> AppResult<bool> {
        // Wildcard selectors track the catalog; only a literal id pins the
        // resource and blocks its deletion.
        let exists: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM entitlements
            WHERE org_id = $1 AND resource_selector = $2 AND resource_selector <> $3
            LIMIT 1
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(resource_id)
        .bind(WILDCARD)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("check entitlement resource references", error))?;

        Ok(exists.is_some())
    }

    async fn any_referencing_action(&self, org_id: OrgId, action_id: &str) -> AppResult<bool> {
        let exists: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM entitlements
            WHERE org_id = $1 AND action_selector = $2 AND action_selector <> $3
            LIMIT 1
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(action_id)
        .bind(WILDCARD)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("check entitlement action references", error))?;

        Ok(exists.is_some())
    }
}
