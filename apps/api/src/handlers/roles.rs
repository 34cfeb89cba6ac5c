use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};

use entiva_core::ActorIdentity;

use crate::dto::{
    CreateRoleRequest, CreateRoleSuiteRequest, RoleDeleteResponse, RoleResponse,
    RoleSuiteDeleteResponse, RoleSuiteResponse, UpdateRoleRequest, UpdateRoleSuiteRequest,
};
use crate::error::ApiResult;
use crate::middleware::expected_etag;
use crate::state::AppState;

pub async fn create_role(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state.roles.create_role(&actor, payload.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state.roles.list_roles(&actor).await?;
    Ok(Json(roles.into_iter().map(Into::into).collect()))
}

pub async fn get_role(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state.roles.get_role(&actor, &role_id).await?;
    Ok(Json(role.into()))
}

pub async fn update_role(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(role_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let etag = expected_etag(&headers)?;
    let role = state
        .roles
        .update_role(&actor, &role_id, payload.into(), &etag)
        .await?;
    Ok(Json(role.into()))
}

pub async fn add_role_entitlement(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path((role_id, entitlement_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<RoleResponse>> {
    let etag = expected_etag(&headers)?;
    let role = state
        .roles
        .add_entitlement(&actor, &role_id, &entitlement_id, &etag)
        .await?;
    Ok(Json(role.into()))
}

pub async fn remove_role_entitlement(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path((role_id, entitlement_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<RoleResponse>> {
    let etag = expected_etag(&headers)?;
    let role = state
        .roles
        .remove_entitlement(&actor, &role_id, &entitlement_id, &etag)
        .await?;
    Ok(Json(role.into()))
}

/// Deletes a role and reports the detachment cascade.
pub async fn delete_role(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(role_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<RoleDeleteResponse>> {
    let etag = expected_etag(&headers)?;
    let outcome = state.roles.delete_role(&actor, &role_id, &etag).await?;
    Ok(Json(outcome.into()))
}

pub async fn create_suite(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<CreateRoleSuiteRequest>,
) -> ApiResult<(StatusCode, Json<RoleSuiteResponse>)> {
    let suite = state
        .roles
        .create_suite(&actor, payload.into_input()?)
        .await?;
    Ok((StatusCode::CREATED, Json(suite.into())))
}

pub async fn list_suites(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
) -> ApiResult<Json<Vec<RoleSuiteResponse>>> {
    let suites = state.roles.list_suites(&actor).await?;
    Ok(Json(suites.into_iter().map(Into::into).collect()))
}

pub async fn get_suite(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(role_suite_id): Path<String>,
) -> ApiResult<Json<RoleSuiteResponse>> {
    let suite = state.roles.get_suite(&actor, &role_suite_id).await?;
    Ok(Json(suite.into()))
}

pub async fn update_suite(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(role_suite_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateRoleSuiteRequest>,
) -> ApiResult<Json<RoleSuiteResponse>> {
    let etag = expected_etag(&headers)?;
    let suite = state
        .roles
        .update_suite(&actor, &role_suite_id, payload.into(), &etag)
        .await?;
    Ok(Json(suite.into()))
}

/// Deletes a role suite and reports the removal cascade.
pub async fn delete_suite(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(role_suite_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<RoleSuiteDeleteResponse>> {
    let etag = expected_etag(&headers)?;
    let outcome = state
        .roles
        .delete_suite(&actor, &role_suite_id, &etag)
        .await?;
    Ok(Json(outcome.into()))
}
