use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::{validation::ValidationErrorSet, wizard::WizardStep};
use crate::utils::validation::to_error_set;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Step {} ({}) has {} validation error(s)", .step.to_number(), .step.label(), .errors.len())]
    StepValidation {
        step: WizardStep,
        errors: ValidationErrorSet,
    },

    #[error("Course API error: {0}")]
    Upstream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Error::StepValidation { step, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": format!("Please fix the errors in step {} ({})", step.to_number(), step.label()),
                    "step": step,
                    "errors": errors,
                }),
            ),
            Error::Validation(err) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Invalid payload",
                    "errors": to_error_set(&err),
                }),
            ),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Error::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            Error::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": msg })),
            Error::UnsupportedMediaType(msg) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, json!({ "error": msg }))
            }
            Error::Upstream(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            Error::Json(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Reqwest(err) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": format!("Course API unreachable: {}", err) }),
            ),
            Error::Config(msg) => {
                tracing::error!("Configuration error surfaced to client: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": msg }))
            }
            Error::Io(err) => {
                tracing::error!("IO error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
