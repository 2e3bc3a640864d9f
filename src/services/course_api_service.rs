use base64::prelude::*;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::dto::course_dto::{CoursePayload, ThumbnailPayload};
use crate::error::{Error, Result};
use crate::models::course::CourseDraft;
use crate::services::upload_service::UploadService;

/// Client for the external course-creation API.
#[derive(Clone)]
pub struct CourseApiService {
    client: Client,
    base_url: Option<String>,
    api_token: Option<String>,
    uploads: UploadService,
}

impl CourseApiService {
    pub fn new(
        base_url: Option<String>,
        api_token: Option<String>,
        uploads: UploadService,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        if let Some(ref url) = base_url {
            info!("Course API enabled: {}", url);
        } else {
            info!("Course API disabled (COURSE_API_URL not set); submissions will be refused");
        }

        Ok(Self {
            client,
            base_url,
            api_token,
            uploads,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Builds the payload for a validated draft and posts it.
    pub async fn submit_draft(&self, draft: &CourseDraft) -> Result<Value> {
        if !self.is_enabled() {
            return Err(not_configured());
        }

        let thumbnail = match &draft.thumbnail {
            Some(image) => {
                let data = self.uploads.read(image).await?;
                Some(ThumbnailPayload {
                    file_name: image.file_name.clone(),
                    content_type: image.content_type.clone(),
                    data_base64: BASE64_STANDARD.encode(&data),
                })
            }
            None => None,
        };

        let payload = CoursePayload::from_draft(draft, thumbnail);
        self.create_course(&payload).await
    }

    pub async fn create_course(&self, payload: &CoursePayload) -> Result<Value> {
        let base_url = self.base_url.as_deref().ok_or_else(not_configured)?;
        let url = format!("{}/courses", base_url);

        info!(
            "Submitting course '{}' ({} questions) to {}",
            payload.title,
            payload.questions.len(),
            url
        );

        let mut request = self.client.post(&url).json(payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Course API request failed: {}", e);
            Error::Upstream(format!("Course API is unreachable: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = upstream_message(&body);
            warn!("Course API returned {}: {}", status, message);
            return Err(Error::Upstream(message));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

fn not_configured() -> Error {
    Error::Config("Course API is not configured".to_string())
}

// Prefers the API's own `message`/`error` field over the raw body.
fn upstream_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Course API rejected the course".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
