use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::difficulty::Difficulty;

pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["True", "False"];

pub const MIN_QUESTION_LEN: usize = 10;
pub const MAX_QUESTION_LEN: usize = 1000;
pub const MIN_EXPLANATION_LEN: usize = 10;
pub const MAX_ANSWER_LEN: usize = 2500;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: Uuid,
    pub difficulty: Difficulty,
    #[serde(rename = "question")]
    pub text: String,
    pub explanation: String,
    #[serde(flatten)]
    pub body: QuestionBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Multiple,
    Single,
    TrueFalse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionBody {
    Multiple {
        options: Vec<String>,
        correct_answer: usize,
    },
    #[serde(rename = "truefalse")]
    TrueFalse { correct_answer: usize },
    Single { answer_text: String },
}

impl QuestionBody {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::Multiple { .. } => QuestionType::Multiple,
            Self::TrueFalse { .. } => QuestionType::TrueFalse,
            Self::Single { .. } => QuestionType::Single,
        }
    }

    /// Options as presented to learners; true/false questions always get the
    /// fixed pair.
    pub fn options(&self) -> Vec<String> {
        match self {
            Self::Multiple { options, .. } => options.clone(),
            Self::TrueFalse { .. } => TRUE_FALSE_OPTIONS.iter().map(|s| s.to_string()).collect(),
            Self::Single { .. } => Vec::new(),
        }
    }

    pub fn correct_answer(&self) -> Option<usize> {
        match self {
            Self::Multiple { correct_answer, .. } | Self::TrueFalse { correct_answer } => {
                Some(*correct_answer)
            }
            Self::Single { .. } => None,
        }
    }
}

impl QuestionRecord {
    pub fn question_type(&self) -> QuestionType {
        self.body.question_type()
    }
}
