use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use entiva_core::ActorIdentity;

use crate::dto::{AssignmentResponse, GrantAssignmentRequest, RevokeAssignmentRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn grant(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<GrantAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let (receiver, target) = payload.into_parts()?;
    let assignment = state.assignments.grant(&actor, receiver, target).await?;
    Ok((StatusCode::CREATED, Json(assignment.into())))
}

/// Removes a direct assignment; the body names the pair to remove.
pub async fn revoke(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<RevokeAssignmentRequest>,
) -> ApiResult<Json<AssignmentResponse>> {
    let (receiver, target) = payload.into_parts()?;
    let assignment = state.assignments.revoke(&actor, receiver, target).await?;
    Ok(Json(assignment.into()))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let assignments = state.assignments.list(&actor).await?;
    Ok(Json(assignments.into_iter().map(Into::into).collect()))
}
