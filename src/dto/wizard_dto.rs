use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::course::CourseDraft;
use crate::models::difficulty::Difficulty;
use crate::models::question::{
    QuestionBody, QuestionRecord, QuestionType, MAX_ANSWER_LEN, MAX_OPTIONS, MIN_OPTIONS,
};
use crate::models::validation::ValidationErrorSet;
use crate::models::video::{VideoContent, VideoKind, VideoLink};
use crate::models::wizard::WizardStep;
use crate::services::course_parser::ParseWarning;
use crate::services::wizard_service::WizardSession;

/// Partial update of the Basic Info step; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BasicInfoPayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub description: Option<String>,

    pub max_marks: Option<u32>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub category_id: Option<String>,

    pub is_paid: Option<bool>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
}

/// Full replacement of one tier's settings.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TierSettingsPayload {
    #[validate(range(min = 1, message = "Marks per question must be at least 1"))]
    pub marks_per_question: Option<u32>,

    #[validate(range(min = 1, message = "Max questions must be at least 1"))]
    pub max_questions: Option<u32>,

    #[validate(range(min = 1, message = "Minimum time must be at least 1 second"))]
    pub min_time_seconds: Option<u32>,

    #[validate(range(min = 1, message = "Maximum time must be at least 1 second"))]
    pub max_time_seconds: Option<u32>,
}

/// Manual question form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_question_shape", skip_on_field_errors = false))]
pub struct AddQuestionPayload {
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[validate(length(
        min = 10,
        max = 1000,
        message = "Question must be between 10 and 1000 characters"
    ))]
    pub question: String,

    #[validate(length(min = 10, message = "Explanation must be at least 10 characters"))]
    pub explanation: String,

    #[serde(default)]
    pub options: Vec<String>,

    pub correct_answer: Option<usize>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub answer_text: Option<String>,
}

fn shape_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_question_shape(payload: &AddQuestionPayload) -> Result<(), ValidationError> {
    match payload.question_type {
        QuestionType::Multiple => {
            let n = payload.options.len();
            if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&n) {
                return Err(shape_error(
                    "options_count",
                    format!("Provide between {} and {} options", MIN_OPTIONS, MAX_OPTIONS),
                ));
            }
            if payload.options.iter().any(|o| o.trim().is_empty()) {
                return Err(shape_error("options_blank", "All options must be filled".into()));
            }
            match payload.correct_answer {
                Some(idx) if idx < n => Ok(()),
                _ => Err(shape_error(
                    "correct_answer",
                    "Select which option is correct".into(),
                )),
            }
        }
        QuestionType::TrueFalse => match payload.correct_answer {
            Some(0) | Some(1) => Ok(()),
            _ => Err(shape_error(
                "correct_answer",
                "Correct answer must be 0 (True) or 1 (False)".into(),
            )),
        },
        QuestionType::Single => {
            let len = payload
                .answer_text
                .as_deref()
                .map(|a| a.chars().count())
                .unwrap_or(0);
            if len == 0 || len > MAX_ANSWER_LEN {
                return Err(shape_error(
                    "answer_text",
                    format!("Answer must be between 1 and {} characters", MAX_ANSWER_LEN),
                ));
            }
            Ok(())
        }
    }
}

impl AddQuestionPayload {
    pub fn into_record(self, difficulty: Difficulty) -> QuestionRecord {
        let correct_answer = self.correct_answer.unwrap_or(0);
        let body = match self.question_type {
            QuestionType::Multiple => QuestionBody::Multiple {
                options: self.options.into_iter().map(|o| o.trim().to_string()).collect(),
                correct_answer,
            },
            QuestionType::TrueFalse => QuestionBody::TrueFalse { correct_answer },
            QuestionType::Single => QuestionBody::Single {
                answer_text: self.answer_text.unwrap_or_default(),
            },
        };
        QuestionRecord {
            id: Uuid::new_v4(),
            difficulty,
            text: self.question.trim().to_string(),
            explanation: self.explanation.trim().to_string(),
            body,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VideoContentPayload {
    #[serde(default)]
    pub kind: VideoKind,

    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 video links are allowed"))]
    pub links: Vec<VideoLink>,
}

impl From<VideoContentPayload> for VideoContent {
    fn from(payload: VideoContentPayload) -> Self {
        Self {
            kind: payload.kind,
            links: payload.links,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftSummary {
    pub max_marks: u32,
    pub configured_marks: u32,
    pub question_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub step: WizardStep,
    pub step_number: u8,
    pub step_label: &'static str,
    pub draft: CourseDraft,
    pub editing_difficulty: Option<Difficulty>,
    pub errors: ValidationErrorSet,
    pub import_warnings: Vec<ParseWarning>,
    pub submitting: bool,
    pub summary: DraftSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&WizardSession> for SessionView {
    fn from(session: &WizardSession) -> Self {
        Self {
            id: session.id,
            step: session.step,
            step_number: session.step.to_number(),
            step_label: session.step.label(),
            draft: session.draft.clone(),
            editing_difficulty: session.editing_difficulty,
            errors: session.errors.clone(),
            import_warnings: session.import_warnings.clone(),
            submitting: session.submitting,
            summary: DraftSummary {
                max_marks: session.draft.max_marks,
                configured_marks: session.draft.configured_marks(),
                question_count: session.draft.question_count(),
            },
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleDifficultyResponse {
    pub difficulty: Difficulty,
    pub selected: bool,
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionAddedResponse {
    pub question: QuestionRecord,
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub routed_to: WizardStep,
    pub valid: bool,
    pub questions_imported: usize,
    pub warnings: Vec<ParseWarning>,
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub course: serde_json::Value,
    pub session: SessionView,
}

// Trims strings and turns empty ones into None.
fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> AddQuestionPayload {
        serde_json::from_value(value).expect("payload deserializes")
    }

    #[test]
    fn multiple_choice_form_requires_filled_options() {
        let p = payload(json!({
            "type": "multiple",
            "question": "Which planet is largest?",
            "explanation": "Jupiter is the largest planet",
            "options": ["Mars", " ", "Jupiter"],
            "correct_answer": 2
        }));
        let errs = p.validate().unwrap_err();
        let set = crate::utils::validation::to_error_set(&errs);
        assert_eq!(set.get("payload"), Some("All options must be filled"));
    }

    #[test]
    fn well_formed_form_becomes_a_record() {
        let p = payload(json!({
            "type": "single",
            "question": "  Name the largest planet  ",
            "explanation": "Jupiter is the largest planet",
            "answer_text": " Jupiter "
        }));
        assert!(p.validate().is_ok());
        let record = p.into_record(Difficulty::Hard);
        assert_eq!(record.text, "Name the largest planet");
        assert_eq!(
            record.body,
            QuestionBody::Single {
                answer_text: "Jupiter".into()
            }
        );
    }

    #[test]
    fn true_false_needs_zero_or_one() {
        let p = payload(json!({
            "type": "truefalse",
            "question": "Water boils at 100C at sea level",
            "explanation": "Standard atmospheric pressure",
            "correct_answer": 3
        }));
        assert!(p.validate().is_err());
    }

    #[test]
    fn short_question_reports_field_message() {
        let p = payload(json!({
            "type": "truefalse",
            "question": "Too short",
            "explanation": "Standard atmospheric pressure",
            "correct_answer": 0
        }));
        let set = crate::utils::validation::to_error_set(&p.validate().unwrap_err());
        assert_eq!(
            set.get("question"),
            Some("Question must be between 10 and 1000 characters")
        );
    }

    #[test]
    fn blank_basic_info_fields_are_ignored() {
        let p: BasicInfoPayload =
            serde_json::from_value(json!({ "title": "   ", "max_marks": 20 })).unwrap();
        assert_eq!(p.title, None);
        assert_eq!(p.max_marks, Some(20));
    }
}
