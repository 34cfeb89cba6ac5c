//! Entiva API composition root.

#![forbid(unsafe_code)]

mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::sync::Arc;

use entiva_application::{
    AssignmentRepository, AssignmentService, CatalogRepository, CatalogService,
    EntitlementRepository, EntitlementService, HistoryRepository, HistoryService,
    PermissionResolver, ReceiverDirectory, RequestRepository, RoleRepository, RoleService,
    WorkflowService,
};
use entiva_core::AppError;
use entiva_infrastructure::{
    InMemoryAuthzRepository, PermissiveReceiverDirectory, PostgresAuthzRepository,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let allowed_origin =
        env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let app_state = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url.as_str())
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to connect to database: {error}"))
                })?;

            sqlx::migrate!("../../crates/infrastructure/migrations")
                .run(&pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to run migrations: {error}"))
                })?;

            if migrate_only {
                info!("migrations applied");
                return Ok(());
            }

            build_state(Arc::new(PostgresAuthzRepository::new(pool)))
        }
        Err(_) => {
            if migrate_only {
                return Err(AppError::Validation(
                    "DATABASE_URL is required to migrate".to_owned(),
                ));
            }

            info!("DATABASE_URL not set, using the in-memory store");
            build_state(Arc::new(InMemoryAuthzRepository::new()))
        }
    };

    let router = api_router::build_router(app_state, allowed_origin.as_str())?;
    let listener = tokio::net::TcpListener::bind((api_host.as_str(), api_port))
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to bind {api_host}:{api_port}: {error}"))
        })?;

    info!(host = api_host.as_str(), port = api_port, "entiva api listening");
    axum::serve(listener, router)
        .await
        .map_err(|error| AppError::Internal(format!("server terminated: {error}")))?;

    Ok(())
}

/// Wires every service against one storage adapter.
fn build_state<R>(repository: Arc<R>) -> AppState
where
    R: CatalogRepository
        + EntitlementRepository
        + RoleRepository
        + AssignmentRepository
        + RequestRepository
        + HistoryRepository
        + 'static,
{
    let catalog: Arc<dyn CatalogRepository> = repository.clone();
    let entitlements: Arc<dyn EntitlementRepository> = repository.clone();
    let roles: Arc<dyn RoleRepository> = repository.clone();
    let assignments: Arc<dyn AssignmentRepository> = repository.clone();
    let requests: Arc<dyn RequestRepository> = repository.clone();
    let history: Arc<dyn HistoryRepository> = repository;
    let directory: Arc<dyn ReceiverDirectory> = Arc::new(PermissiveReceiverDirectory);

    AppState {
        catalog: CatalogService::new(catalog.clone(), entitlements.clone()),
        entitlements: EntitlementService::new(entitlements.clone(), catalog.clone()),
        roles: RoleService::new(
            roles.clone(),
            entitlements,
            assignments.clone(),
            history.clone(),
        ),
        assignments: AssignmentService::new(
            assignments.clone(),
            roles.clone(),
            history.clone(),
            directory.clone(),
        ),
        workflow: WorkflowService::new(
            requests,
            roles.clone(),
            assignments.clone(),
            history.clone(),
            directory,
        ),
        resolver: PermissionResolver::new(assignments, roles, catalog),
        history: HistoryService::new(history),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
