use axum::extract::{Query, State};
use axum::{Extension, Json};

use entiva_application::PermissionCheck;
use entiva_core::ActorIdentity;

use crate::dto::{
    CheckPermissionRequest, CheckPermissionResponse, EffectivePermissionResponse, ResolveParams,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the full effective permission set of a principal.
pub async fn resolve(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Query(params): Query<ResolveParams>,
) -> ApiResult<Json<Vec<EffectivePermissionResponse>>> {
    let principal = params.into_principal(&actor);
    let permissions = state.resolver.resolve(&actor, &principal).await?;
    Ok(Json(permissions.into_iter().map(Into::into).collect()))
}

/// Answers one permission question.
pub async fn check(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<CheckPermissionRequest>,
) -> ApiResult<Json<CheckPermissionResponse>> {
    let principal = payload.principal(&actor);
    let check = PermissionCheck {
        resource_id: payload.resource_id,
        action_id: payload.action_id,
        scope_ref: payload.scope_ref,
    };

    let allowed = state
        .resolver
        .has_permission(&actor, &principal, &check)
        .await?;
    Ok(Json(CheckPermissionResponse { allowed }))
}
