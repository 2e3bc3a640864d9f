use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::course::CourseDraft;
use crate::models::difficulty::Difficulty;
use crate::models::question::QuestionType;
use crate::models::video::{VideoKind, VideoLink};

/// Body sent to the course-creation API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursePayload {
    pub title: String,
    pub description: String,
    pub max_marks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub is_paid: bool,
    pub price: f64,
    pub difficulties: Vec<DifficultyPayload>,
    pub questions: Vec<QuestionPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_content: Option<VideoContentPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ThumbnailPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyPayload {
    pub level: Difficulty,
    pub marks_per_question: u32,
    pub max_questions: u32,
    pub total_marks: u32,
    pub timer: TimerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSettings {
    pub min_seconds: u32,
    pub max_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub id: Uuid,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoContentPayload {
    pub kind: VideoKind,
    pub links: Vec<VideoLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailPayload {
    pub file_name: String,
    pub content_type: String,
    pub data_base64: String,
}

impl CoursePayload {
    /// Builds the payload from a draft that already passed validation.
    /// Tiers without complete settings are left out.
    pub fn from_draft(draft: &CourseDraft, thumbnail: Option<ThumbnailPayload>) -> Self {
        let difficulties = draft
            .difficulties
            .iter()
            .filter_map(|&level| {
                let s = draft.settings_for(level)?;
                Some(DifficultyPayload {
                    level,
                    marks_per_question: s.marks_per_question?,
                    max_questions: s.max_questions?,
                    total_marks: s.total_marks()?,
                    timer: TimerSettings {
                        min_seconds: s.min_time_seconds?,
                        max_seconds: s.max_time_seconds?,
                    },
                })
            })
            .collect();

        let questions = draft
            .difficulties
            .iter()
            .flat_map(|&d| draft.questions_for(d))
            .map(|q| QuestionPayload {
                id: q.id,
                difficulty: q.difficulty,
                question_type: q.question_type(),
                question: q.text.clone(),
                options: q.body.options(),
                correct_answer: q.body.correct_answer(),
                answer: match &q.body {
                    crate::models::question::QuestionBody::Single { answer_text } => {
                        Some(answer_text.clone())
                    }
                    _ => None,
                },
                explanation: q.explanation.clone(),
            })
            .collect();

        let video_content = (draft.is_paid && draft.video.is_enabled()).then(|| VideoContentPayload {
            kind: draft.video.kind,
            links: draft.video.filled_links().map(|(_, l)| l.clone()).collect(),
        });

        Self {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            max_marks: draft.max_marks,
            category_id: draft.category_id.clone(),
            is_paid: draft.is_paid,
            price: if draft.is_paid { draft.price } else { 0.0 },
            difficulties,
            questions,
            video_content,
            thumbnail,
        }
    }
}
