use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use entiva_application::CatalogRepository;
use entiva_core::{AppError, AppResult, Etag, OrgId};
use entiva_domain::{ActionDefinition, ResourceDefinition, ScopeKind};

use super::{PostgresAuthzRepository, internal, is_unique_violation};

#[derive(Debug, FromRow)]
struct ResourceRow {
    id: String,
    name: String,
    resource_type: String,
    resource_ref: Option<String>,
    scope_kind: String,
    etag: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceRow {
    fn into_domain(self) -> AppResult<ResourceDefinition> {
        ResourceDefinition::restore(
            self.id,
            self.name,
            self.resource_type,
            self.resource_ref,
            ScopeKind::from_str(self.scope_kind.as_str())?,
            Etag::from_value(self.etag)?,
            self.created_at,
            self.updated_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct ActionRow {
    id: String,
    resource_id: String,
    name: String,
    description: Option<String>,
    etag: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ActionRow {
    fn into_domain(self) -> AppResult<ActionDefinition> {
        ActionDefinition::restore(
            self.id,
            self.resource_id,
            self.name,
            self.description,
            Etag::from_value(self.etag)?,
            self.created_at,
            self.updated_at,
        )
    }
}

#[async_trait]
impl CatalogRepository for PostgresAuthzRepository {
    async fn insert_resource(&self, org_id: OrgId, resource: ResourceDefinition) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO catalog_resources (
                org_id, id, name, resource_type, resource_ref,
                scope_kind, etag, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(resource.resource_id())
        .bind(resource.name().as_str())
        .bind(resource.resource_type().as_str())
        .bind(resource.resource_ref())
        .bind(resource.scope_kind().as_str())
        .bind(resource.etag().as_str())
        .bind(resource.created_at())
        .bind(resource.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::AlreadyExists(format!(
                    "resource name '{}' is already taken",
                    resource.name()
                ))
            } else {
                internal("insert resource", error)
            }
        })?;

        Ok(())
    }

    async fn list_resources(&self, org_id: OrgId) -> AppResult<Vec<ResourceDefinition>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, name, resource_type, resource_ref, scope_kind,
                   etag, created_at, updated_at
            FROM catalog_resources
            WHERE org_id = $1
            ORDER BY name
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list resources", error))?;

        rows.into_iter().map(ResourceRow::into_domain).collect()
    }

    async fn find_resource(
        &self,
        org_id: OrgId,
        resource_id: &str,
    ) -> AppResult<Option<ResourceDefinition>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, name, resource_type, resource_ref, scope_kind,
                   etag, created_at, updated_at
            FROM catalog_resources
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("load resource", error))?;

        row.map(ResourceRow::into_domain).transpose()
    }

    async fn find_resource_by_name(
        &self,
        org_id: OrgId,
        name: &str,
    ) -> AppResult<Option<ResourceDefinition>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, name, resource_type, resource_ref, scope_kind,
                   etag, created_at, updated_at
            FROM catalog_resources
            WHERE org_id = $1 AND name = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("load resource by name", error))?;

        row.map(ResourceRow::into_domain).transpose()
    }

    async fn delete_resource(
        &self,
        org_id: OrgId,
        resource_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("open resource delete transaction", error))?;

        let stored_etag: Option<String> = sqlx::query_scalar(
            r#"
            SELECT etag FROM catalog_resources
            WHERE org_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(resource_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| internal("load resource for delete", error))?;

        let stored_etag = stored_etag.ok_or_else(|| {
            AppError::NotFound(format!("resource '{resource_id}' does not exist"))
        })?;
        if stored_etag != expected_etag.as_str() {
            return Err(AppError::Conflict(format!(
                "resource '{resource_id}' was modified concurrently"
            )));
        }

        sqlx::query("DELETE FROM catalog_actions WHERE org_id = $1 AND resource_id = $2")
            .bind(org_id.as_uuid())
            .bind(resource_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("delete resource actions", error))?;

        sqlx::query("DELETE FROM catalog_resources WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(resource_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("delete resource", error))?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("commit resource delete", error))?;
        Ok(())
    }

    async fn insert_action(&self, org_id: OrgId, action: ActionDefinition) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO catalog_actions (
                org_id, id, resource_id, name, description,
                etag, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(action.action_id())
        .bind(action.resource_id())
        .bind(action.name().as_str())
        .bind(action.description())
        .bind(action.etag().as_str())
        .bind(action.created_at())
        .bind(action.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::AlreadyExists(format!(
                    "action name '{}' is already taken within resource '{}'",
                    action.name(),
                    action.resource_id()
                ))
            } else {
                internal("insert action", error)
            }
        })?;

        Ok(())
    }

    async fn list_actions(
        &self,
        org_id: OrgId,
        resource_id: &str,
    ) -> AppResult<Vec<ActionDefinition>> {
        let rows = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT id, resource_id, name, description, etag, created_at, updated_at
            FROM catalog_actions
            WHERE org_id = $1 AND resource_id = $2
            ORDER BY name
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list actions", error))?;

        rows.into_iter().map(ActionRow::into_domain).collect()
    }

    async fn list_all_actions(&self, org_id: OrgId) -> AppResult<Vec<ActionDefinition>> {
        let rows = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT id, resource_id, name, description, etag, created_at, updated_at
            FROM catalog_actions
            WHERE org_id = $1
            ORDER BY name
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("list all actions", error))?;

        rows.into_iter().map(ActionRow::into_domain).collect()
    }

    async fn find_action(
        &self,
        org_id: OrgId,
        action_id: &str,
    ) -> AppResult<Option<ActionDefinition>> {
        let row = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT id, resource_id, name, description, etag, created_at, updated_at
            FROM catalog_actions
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(action_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("load action", error))?;

        row.map(ActionRow::into_domain).transpose()
    }

    async fn delete_action(
        &self,
        org_id: OrgId,
        action_id: &str,
        expected_etag: &Etag,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM catalog_actions
            WHERE org_id = $1 AND id = $2 AND etag = $3
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(action_id)
        .bind(expected_etag.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| internal("delete action", error))?;

        if result.rows_affected() == 0 {
            let exists: Option<i32> = sqlx::query_scalar(
                "SELECT 1 FROM catalog_actions WHERE org_id = $1 AND id = $2",
            )
            .bind(org_id.as_uuid())
            .bind(action_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| internal("check action existence", error))?;

            return Err(match exists {
                Some(_) => AppError::Conflict(format!(
                    "action '{action_id}' was modified concurrently"
                )),
                None => AppError::NotFound(format!("action '{action_id}' does not exist")),
            });
        }

        Ok(())
    }
}
