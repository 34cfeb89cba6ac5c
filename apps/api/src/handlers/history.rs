use axum::extract::{Query, State};
use axum::{Extension, Json};

use entiva_core::ActorIdentity;

use crate::dto::{HistoryQueryParams, HistoryRecordResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists permission history, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Query(params): Query<HistoryQueryParams>,
) -> ApiResult<Json<Vec<HistoryRecordResponse>>> {
    let records = state.history.list(&actor, params.into()).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
