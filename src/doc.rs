use crate::routes::{categories, health, wizard};
use utoipa::OpenApi;

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        categories::list_categories,
        wizard::create_session,
        wizard::get_session,
        wizard::discard_session,
        wizard::update_basic_info,
        wizard::toggle_difficulty,
        wizard::update_tier_settings,
        wizard::select_editing_difficulty,
        wizard::add_question,
        wizard::remove_question,
        wizard::clear_questions,
        wizard::update_video,
        wizard::upload_thumbnail,
        wizard::import_course,
        wizard::next_step,
        wizard::prev_step,
        wizard::submit_course
    ),
    tags(
        (name = "Wizard", description = "Course creation wizard"),
        (name = "Catalog", description = "Reference data"),
    ),
    info(
        title = "Course Builder API",
        version = "0.1.0",
        description = "Course definition import, validation and creation wizard"
    )
)]
pub struct ApiDoc;
