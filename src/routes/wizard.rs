use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::wizard_dto::{
    AddQuestionPayload, BasicInfoPayload, ImportResponse, QuestionAddedResponse, SessionView,
    SubmitResponse, TierSettingsPayload, ToggleDifficultyResponse, VideoContentPayload,
};
use crate::error::{Error, Result};
use crate::models::difficulty::Difficulty;
use crate::services::course_parser::parse_course;
use crate::services::upload_service::read_import_file;
use crate::AppState;

fn parse_difficulty(raw: &str) -> Result<Difficulty> {
    raw.parse().map_err(Error::BadRequest)
}

#[utoipa::path(
    post,
    path = "/api/wizard/sessions",
    responses(
        (status = 201, description = "Wizard session created", body = SessionView)
    )
)]
#[axum::debug_handler]
pub async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let session = state.sessions.create().await;
    Ok((StatusCode::CREATED, Json(SessionView::from(&session))))
}

#[utoipa::path(
    get,
    path = "/api/wizard/sessions/{id}",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    responses(
        (status = 200, description = "Current wizard state", body = SessionView),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let session = state.sessions.get(id).await?;
    Ok(Json(SessionView::from(&session)))
}

#[utoipa::path(
    delete,
    path = "/api/wizard/sessions/{id}",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    responses(
        (status = 204, description = "Session and draft discarded"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "A submission is in flight")
    )
)]
#[axum::debug_handler]
pub async fn discard_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let session = state.sessions.remove(id).await?;
    if let Some(thumbnail) = &session.draft.thumbnail {
        state.uploads.remove(thumbnail).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/wizard/sessions/{id}/basic-info",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    request_body = BasicInfoPayload,
    responses(
        (status = 200, description = "Basic info updated", body = SessionView),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn update_basic_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BasicInfoPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state
        .sessions
        .update(id, |s| {
            s.update_basic_info(payload)?;
            Ok(SessionView::from(&*s))
        })
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/wizard/sessions/{id}/difficulties/{difficulty}/toggle",
    params(
        ("id" = Uuid, Path, description = "Wizard session ID"),
        ("difficulty" = String, Path, description = "easy, medium or hard")
    ),
    responses(
        (status = 200, description = "Tier selection flipped", body = ToggleDifficultyResponse),
        (status = 400, description = "Unknown difficulty")
    )
)]
#[axum::debug_handler]
pub async fn toggle_difficulty(
    State(state): State<AppState>,
    Path((id, difficulty)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse> {
    let difficulty = parse_difficulty(&difficulty)?;
    let response = state
        .sessions
        .update(id, |s| {
            let selected = s.toggle_difficulty(difficulty)?;
            Ok(ToggleDifficultyResponse {
                difficulty,
                selected,
                session: SessionView::from(&*s),
            })
        })
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/wizard/sessions/{id}/difficulties/{difficulty}/settings",
    params(
        ("id" = Uuid, Path, description = "Wizard session ID"),
        ("difficulty" = String, Path, description = "easy, medium or hard")
    ),
    request_body = TierSettingsPayload,
    responses(
        (status = 200, description = "Tier settings stored", body = SessionView),
        (status = 404, description = "Tier not selected")
    )
)]
#[axum::debug_handler]
pub async fn update_tier_settings(
    State(state): State<AppState>,
    Path((id, difficulty)): Path<(Uuid, String)>,
    Json(payload): Json<TierSettingsPayload>,
) -> Result<impl IntoResponse> {
    let difficulty = parse_difficulty(&difficulty)?;
    payload.validate()?;
    let session = state
        .sessions
        .update(id, |s| {
            s.update_settings(difficulty, payload)?;
            Ok(SessionView::from(&*s))
        })
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    put,
    path = "/api/wizard/sessions/{id}/difficulties/{difficulty}/edit",
    params(
        ("id" = Uuid, Path, description = "Wizard session ID"),
        ("difficulty" = String, Path, description = "easy, medium or hard")
    ),
    responses(
        (status = 200, description = "Editing tier switched", body = SessionView),
        (status = 404, description = "Tier not selected")
    )
)]
#[axum::debug_handler]
pub async fn select_editing_difficulty(
    State(state): State<AppState>,
    Path((id, difficulty)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse> {
    let difficulty = parse_difficulty(&difficulty)?;
    let session = state
        .sessions
        .update(id, |s| {
            s.select_editing_difficulty(difficulty)?;
            Ok(SessionView::from(&*s))
        })
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/wizard/sessions/{id}/difficulties/{difficulty}/questions",
    params(
        ("id" = Uuid, Path, description = "Wizard session ID"),
        ("difficulty" = String, Path, description = "easy, medium or hard")
    ),
    request_body = AddQuestionPayload,
    responses(
        (status = 201, description = "Question added", body = QuestionAddedResponse),
        (status = 400, description = "Invalid question"),
        (status = 404, description = "Tier not selected")
    )
)]
#[axum::debug_handler]
pub async fn add_question(
    State(state): State<AppState>,
    Path((id, difficulty)): Path<(Uuid, String)>,
    Json(payload): Json<AddQuestionPayload>,
) -> Result<impl IntoResponse> {
    let difficulty = parse_difficulty(&difficulty)?;
    payload.validate()?;
    let response = state
        .sessions
        .update(id, |s| {
            let question = s.add_question(difficulty, payload)?;
            Ok(QuestionAddedResponse {
                question,
                session: SessionView::from(&*s),
            })
        })
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/wizard/sessions/{id}/difficulties/{difficulty}/questions/{question_id}",
    params(
        ("id" = Uuid, Path, description = "Wizard session ID"),
        ("difficulty" = String, Path, description = "easy, medium or hard"),
        ("question_id" = Uuid, Path, description = "Question ID")
    ),
    responses(
        (status = 200, description = "Question removed", body = SessionView),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn remove_question(
    State(state): State<AppState>,
    Path((id, difficulty, question_id)): Path<(Uuid, String, Uuid)>,
) -> Result<impl IntoResponse> {
    let difficulty = parse_difficulty(&difficulty)?;
    let session = state
        .sessions
        .update(id, |s| {
            s.remove_question(difficulty, question_id)?;
            Ok(SessionView::from(&*s))
        })
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    delete,
    path = "/api/wizard/sessions/{id}/difficulties/{difficulty}/questions",
    params(
        ("id" = Uuid, Path, description = "Wizard session ID"),
        ("difficulty" = String, Path, description = "easy, medium or hard")
    ),
    responses(
        (status = 200, description = "All questions of the tier removed", body = SessionView)
    )
)]
#[axum::debug_handler]
pub async fn clear_questions(
    State(state): State<AppState>,
    Path((id, difficulty)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse> {
    let difficulty = parse_difficulty(&difficulty)?;
    let session = state
        .sessions
        .update(id, |s| {
            let removed = s.clear_questions(difficulty)?;
            info!(session = %id, %difficulty, removed, "questions cleared");
            Ok(SessionView::from(&*s))
        })
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    put,
    path = "/api/wizard/sessions/{id}/video",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    request_body = VideoContentPayload,
    responses(
        (status = 200, description = "Video content stored", body = SessionView)
    )
)]
#[axum::debug_handler]
pub async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VideoContentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state
        .sessions
        .update(id, |s| {
            s.set_video(payload.into())?;
            Ok(SessionView::from(&*s))
        })
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/wizard/sessions/{id}/thumbnail",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    responses(
        (status = 200, description = "Thumbnail attached", body = SessionView),
        (status = 400, description = "Missing or invalid image"),
        (status = 415, description = "Unsupported image type")
    )
)]
#[axum::debug_handler]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    // Fail fast before anything lands on disk.
    state.sessions.get(id).await?;

    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("thumbnail") {
            let file_name = field.file_name().unwrap_or("thumbnail.bin").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data: Bytes = field.bytes().await?;
            image = Some(
                state
                    .uploads
                    .save_thumbnail(&file_name, content_type.as_deref(), &data)
                    .await?,
            );
        }
    }
    let image = image.ok_or_else(|| Error::BadRequest("Thumbnail file is required".into()))?;

    let attached = image.clone();
    let outcome = state
        .sessions
        .update(id, |s| {
            let previous = s.set_thumbnail(attached)?;
            Ok((previous, SessionView::from(&*s)))
        })
        .await;

    match outcome {
        Ok((previous, session)) => {
            if let Some(previous) = previous {
                state.uploads.remove(&previous).await;
            }
            Ok(Json(session))
        }
        Err(e) => {
            state.uploads.remove(&image).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/wizard/sessions/{id}/import",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    responses(
        (status = 200, description = "Course file imported and routed", body = ImportResponse),
        (status = 400, description = "No thumbnail attached or unreadable file"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Not a .txt file")
    )
)]
#[axum::debug_handler]
pub async fn import_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut text = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data: Bytes = field.bytes().await?;
            text = Some(read_import_file(
                file_name.as_deref(),
                content_type.as_deref(),
                &data,
                state.max_import_bytes,
            )?);
        }
    }
    let text = text.ok_or_else(|| Error::BadRequest("Course file is required".into()))?;

    // Parse outside the store lock; only applying the result needs it.
    let parsed = parse_course(&text, &state.categories);
    let response = state
        .sessions
        .update(id, |s| {
            let outcome = s.apply_import(parsed)?;
            Ok(ImportResponse {
                routed_to: s.step,
                valid: outcome.report.is_valid(),
                questions_imported: outcome.questions_imported,
                warnings: outcome.warnings,
                session: SessionView::from(&*s),
            })
        })
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/wizard/sessions/{id}/next",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    responses(
        (status = 200, description = "Moved to the next step", body = SessionView),
        (status = 422, description = "Current step has errors")
    )
)]
#[axum::debug_handler]
pub async fn next_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let session = state
        .sessions
        .update(id, |s| {
            s.next()?;
            Ok(SessionView::from(&*s))
        })
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/wizard/sessions/{id}/prev",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    responses(
        (status = 200, description = "Moved to the previous step", body = SessionView)
    )
)]
#[axum::debug_handler]
pub async fn prev_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let session = state
        .sessions
        .update(id, |s| {
            s.prev()?;
            Ok(SessionView::from(&*s))
        })
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/wizard/sessions/{id}/submit",
    params(("id" = Uuid, Path, description = "Wizard session ID")),
    responses(
        (status = 201, description = "Course created; the wizard starts over", body = SubmitResponse),
        (status = 409, description = "A submission is already in flight"),
        (status = 422, description = "The draft has errors"),
        (status = 502, description = "Course API rejected the course"),
        (status = 503, description = "Course API not configured")
    )
)]
#[axum::debug_handler]
pub async fn submit_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let draft = state.sessions.update(id, |s| s.begin_submission()).await?;

    // The session lock is not held while the API call is in flight.
    let result = state.course_api.submit_draft(&draft).await;
    let succeeded = result.is_ok();

    let session = state
        .sessions
        .update(id, |s| {
            s.finish_submission(succeeded);
            Ok(SessionView::from(&*s))
        })
        .await?;

    match result {
        Ok(course) => {
            if let Some(thumbnail) = &draft.thumbnail {
                state.uploads.remove(thumbnail).await;
            }
            info!(session = %id, title = %draft.title, "course submitted");
            Ok((StatusCode::CREATED, Json(SubmitResponse { course, session })))
        }
        Err(e) => {
            warn!(session = %id, "course submission failed: {}", e);
            Err(e)
        }
    }
}
