use axum::{extract::State, response::IntoResponse, Json};

use crate::error::Result;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Course categories accepted by the course API", body = [Category])
    )
)]
#[axum::debug_handler]
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.categories.as_ref().clone()))
}
