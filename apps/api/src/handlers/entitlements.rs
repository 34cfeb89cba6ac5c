use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};

use entiva_core::ActorIdentity;

use crate::dto::{CreateEntitlementRequest, EntitlementDeleteResponse, EntitlementResponse};
use crate::error::ApiResult;
use crate::middleware::expected_etag;
use crate::state::AppState;

pub async fn create_entitlement(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<CreateEntitlementRequest>,
) -> ApiResult<(StatusCode, Json<EntitlementResponse>)> {
    let entitlement = state.entitlements.create(&actor, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(entitlement.into())))
}

pub async fn list_entitlements(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
) -> ApiResult<Json<Vec<EntitlementResponse>>> {
    let entitlements = state.entitlements.list(&actor).await?;
    Ok(Json(entitlements.into_iter().map(Into::into).collect()))
}

pub async fn get_entitlement(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(entitlement_id): Path<String>,
) -> ApiResult<Json<EntitlementResponse>> {
    let entitlement = state.entitlements.get(&actor, &entitlement_id).await?;
    Ok(Json(entitlement.into()))
}

/// Deletes an entitlement and reports the detachment cascade.
pub async fn delete_entitlement(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(entitlement_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<EntitlementDeleteResponse>> {
    let etag = expected_etag(&headers)?;
    let outcome = state
        .entitlements
        .delete(&actor, &entitlement_id, &etag)
        .await?;
    Ok(Json(outcome.into()))
}
