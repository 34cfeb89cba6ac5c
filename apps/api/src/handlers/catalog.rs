use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};

use entiva_core::ActorIdentity;

use crate::dto::{ActionResponse, CreateActionRequest, CreateResourceRequest, ResourceResponse};
use crate::error::ApiResult;
use crate::middleware::expected_etag;
use crate::state::AppState;

pub async fn create_resource(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<CreateResourceRequest>,
) -> ApiResult<(StatusCode, Json<ResourceResponse>)> {
    let resource = state
        .catalog
        .create_resource(&actor, payload.into_input()?)
        .await?;
    Ok((StatusCode::CREATED, Json(resource.into())))
}

pub async fn list_resources(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
) -> ApiResult<Json<Vec<ResourceResponse>>> {
    let resources = state.catalog.list_resources(&actor).await?;
    Ok(Json(resources.into_iter().map(Into::into).collect()))
}

pub async fn get_resource(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(resource_id): Path<String>,
) -> ApiResult<Json<ResourceResponse>> {
    let resource = state.catalog.get_resource(&actor, &resource_id).await?;
    Ok(Json(resource.into()))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let etag = expected_etag(&headers)?;
    state
        .catalog
        .delete_resource(&actor, &resource_id, &etag)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_action(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<CreateActionRequest>,
) -> ApiResult<(StatusCode, Json<ActionResponse>)> {
    let action = state.catalog.create_action(&actor, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(action.into())))
}

pub async fn list_actions(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(resource_id): Path<String>,
) -> ApiResult<Json<Vec<ActionResponse>>> {
    let actions = state.catalog.list_actions(&actor, &resource_id).await?;
    Ok(Json(actions.into_iter().map(Into::into).collect()))
}

pub async fn delete_action(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(action_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let etag = expected_etag(&headers)?;
    state.catalog.delete_action(&actor, &action_id, &etag).await?;
    Ok(StatusCode::NO_CONTENT)
}
