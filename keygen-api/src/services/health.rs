//! Health check endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    match state.key_manager.store().health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "OK" }))).into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
