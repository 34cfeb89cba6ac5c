//! Route table for the entitlement engine API.

use axum::Router;
use axum::http::header::{CONTENT_TYPE, IF_MATCH};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{delete, get, post};

use entiva_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

/// Builds the full router; every route except the health probe requires a
/// forwarded identity.
pub fn build_router(app_state: AppState, allowed_origin: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/catalog/resources",
            get(handlers::catalog::list_resources).post(handlers::catalog::create_resource),
        )
        .route(
            "/api/catalog/resources/{resource_id}",
            get(handlers::catalog::get_resource).delete(handlers::catalog::delete_resource),
        )
        .route(
            "/api/catalog/resources/{resource_id}/actions",
            get(handlers::catalog::list_actions),
        )
        .route(
            "/api/catalog/actions",
            post(handlers::catalog::create_action),
        )
        .route(
            "/api/catalog/actions/{action_id}",
            delete(handlers::catalog::delete_action),
        )
        .route(
            "/api/entitlements",
            get(handlers::entitlements::list_entitlements)
                .post(handlers::entitlements::create_entitlement),
        )
        .route(
            "/api/entitlements/{entitlement_id}",
            get(handlers::entitlements::get_entitlement)
                .delete(handlers::entitlements::delete_entitlement),
        )
        .route(
            "/api/roles",
            get(handlers::roles::list_roles).post(handlers::roles::create_role),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::roles::get_role)
                .put(handlers::roles::update_role)
                .delete(handlers::roles::delete_role),
        )
        .route(
            "/api/roles/{role_id}/entitlements/{entitlement_id}",
            post(handlers::roles::add_role_entitlement)
                .delete(handlers::roles::remove_role_entitlement),
        )
        .route(
            "/api/role-suites",
            get(handlers::roles::list_suites).post(handlers::roles::create_suite),
        )
        .route(
            "/api/role-suites/{role_suite_id}",
            get(handlers::roles::get_suite)
                .put(handlers::roles::update_suite)
                .delete(handlers::roles::delete_suite),
        )
        .route(
            "/api/assignments",
            get(handlers::assignments::list).post(handlers::assignments::grant),
        )
        .route(
            "/api/assignments/revoke",
            post(handlers::assignments::revoke),
        )
        .route(
            "/api/requests/grant",
            post(handlers::requests::submit_grant),
        )
        .route(
            "/api/requests/revoke",
            post(handlers::requests::submit_revoke),
        )
        .route("/api/requests", get(handlers::requests::list_requests))
        .route(
            "/api/requests/{request_id}",
            get(handlers::requests::get_request),
        )
        .route(
            "/api/requests/{request_id}/approve",
            post(handlers::requests::approve),
        )
        .route(
            "/api/requests/{request_id}/reject",
            post(handlers::requests::reject),
        )
        .route(
            "/api/requests/{request_id}/cancel",
            post(handlers::requests::cancel),
        )
        .route("/api/permissions", get(handlers::permissions::resolve))
        .route(
            "/api/permissions/check",
            post(handlers::permissions::check),
        )
        .route("/api/history", get(handlers::history::list))
        .layer(from_fn(middleware::require_identity));

    let origin = HeaderValue::from_str(allowed_origin).map_err(|_| {
        AppError::Validation(format!("invalid allowed origin '{allowed_origin}'"))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            IF_MATCH,
            HeaderName::from_static("x-entiva-subject"),
            HeaderName::from_static("x-entiva-display-name"),
            HeaderName::from_static("x-entiva-org"),
            HeaderName::from_static("x-entiva-groups"),
            HeaderName::from_static("x-entiva-admin"),
        ]);

    Ok(Router::new()
        .route("/api/health", get(handlers::health::health))
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
