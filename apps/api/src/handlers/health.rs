use axum::Json;
use serde::Serialize;

/// Liveness body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Reports process liveness; requires no identity.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
