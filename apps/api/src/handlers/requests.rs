use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};

use entiva_core::ActorIdentity;

use crate::dto::{
    AccessRequestResponse, ListRequestsParams, SubmitGrantRequest, SubmitRevokeRequest,
};
use crate::error::ApiResult;
use crate::middleware::expected_etag;
use crate::state::AppState;

pub async fn submit_grant(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<SubmitGrantRequest>,
) -> ApiResult<(StatusCode, Json<AccessRequestResponse>)> {
    let request = state
        .workflow
        .submit_grant(&actor, payload.into_input()?)
        .await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

pub async fn submit_revoke(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<SubmitRevokeRequest>,
) -> ApiResult<(StatusCode, Json<AccessRequestResponse>)> {
    let request = state
        .workflow
        .submit_revoke(&actor, payload.into_input()?)
        .await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

pub async fn list_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Query(params): Query<ListRequestsParams>,
) -> ApiResult<Json<Vec<AccessRequestResponse>>> {
    let requests = state
        .workflow
        .list_requests(&actor, params.into_query()?)
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

pub async fn get_request(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<AccessRequestResponse>> {
    let request = state.workflow.get_request(&actor, &request_id).await?;
    Ok(Json(request.into()))
}

pub async fn approve(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<AccessRequestResponse>> {
    let etag = expected_etag(&headers)?;
    let request = state.workflow.approve(&actor, &request_id, &etag).await?;
    Ok(Json(request.into()))
}

pub async fn reject(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<AccessRequestResponse>> {
    let etag = expected_etag(&headers)?;
    let request = state.workflow.reject(&actor, &request_id, &etag).await?;
    Ok(Json(request.into()))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<AccessRequestResponse>> {
    let etag = expected_etag(&headers)?;
    let request = state.workflow.cancel(&actor, &request_id, &etag).await?;
    Ok(Json(request.into()))
}
