pub mod config;
pub mod doc;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::Config;
use crate::models::course::Category;
use crate::services::{
    course_api_service::CourseApiService, session_service::SessionStore,
    upload_service::UploadService,
};

// Room for multipart framing around the largest accepted file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub uploads: UploadService,
    pub course_api: CourseApiService,
    pub categories: Arc<Vec<Category>>,
    pub max_import_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> error::Result<Self> {
        let uploads = UploadService::new(&config.uploads_dir);
        let course_api = CourseApiService::new(
            config.course_api_url.clone(),
            config.course_api_token.clone(),
            uploads.clone(),
        )?;

        Ok(Self {
            sessions: SessionStore::new(),
            uploads,
            course_api,
            categories: Arc::new(config.categories.clone()),
            max_import_bytes: config.max_import_bytes,
        })
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    use crate::routes::{categories, health, wizard};

    let body_limit = config
        .max_import_bytes
        .max(services::upload_service::MAX_THUMBNAIL_BYTES)
        + MULTIPART_OVERHEAD_BYTES;

    let wizard_api = Router::new()
        .route("/api/wizard/sessions", post(wizard::create_session))
        .route(
            "/api/wizard/sessions/:id",
            get(wizard::get_session).delete(wizard::discard_session),
        )
        .route(
            "/api/wizard/sessions/:id/basic-info",
            put(wizard::update_basic_info),
        )
        .route(
            "/api/wizard/sessions/:id/difficulties/:difficulty/toggle",
            post(wizard::toggle_difficulty),
        )
        .route(
            "/api/wizard/sessions/:id/difficulties/:difficulty/settings",
            put(wizard::update_tier_settings),
        )
        .route(
            "/api/wizard/sessions/:id/difficulties/:difficulty/edit",
            put(wizard::select_editing_difficulty),
        )
        .route(
            "/api/wizard/sessions/:id/difficulties/:difficulty/questions",
            post(wizard::add_question).delete(wizard::clear_questions),
        )
        .route(
            "/api/wizard/sessions/:id/difficulties/:difficulty/questions/:question_id",
            delete(wizard::remove_question),
        )
        .route("/api/wizard/sessions/:id/video", put(wizard::update_video))
        .route(
            "/api/wizard/sessions/:id/thumbnail",
            post(wizard::upload_thumbnail),
        )
        .route("/api/wizard/sessions/:id/import", post(wizard::import_course))
        .route("/api/wizard/sessions/:id/next", post(wizard::next_step))
        .route("/api/wizard/sessions/:id/prev", post(wizard::prev_step))
        .route("/api/wizard/sessions/:id/submit", post(wizard::submit_course))
        .route("/api/categories", get(categories::list_categories))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(doc::ApiDoc::openapi()) }),
        )
        .merge(wizard_api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::cors_layer(&config.cors_allowed_origins)),
        )
        .with_state(state)
}
