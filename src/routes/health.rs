use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "sessions": state.sessions.len().await,
        "course_api": state.course_api.is_enabled(),
    });
    (StatusCode::OK, Json(body))
}
