use uuid::Uuid;

use crate::models::difficulty::Difficulty;
use crate::models::question::{QuestionBody, QuestionRecord, QuestionType};
use crate::utils::normalize::normalize_key;

/// Accumulates the lines of one `Q:` block.
#[derive(Debug, Clone)]
pub struct QuestionBuilder {
    difficulty: Option<Difficulty>,
    /// 1-based line of the `Q:` line, for warnings.
    pub line: usize,
    text: String,
    question_type: Option<QuestionType>,
    options: Vec<String>,
    correct_answer: Option<usize>,
    answer_text: Option<String>,
    explanation: String,
}

/// Why a block could not become a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildRejection {
    MissingText,
    MissingExplanation,
    NoDifficulty,
}

impl BuildRejection {
    pub fn describe(self) -> &'static str {
        match self {
            Self::MissingText => "question text is empty",
            Self::MissingExplanation => "no EXPLANATION line",
            Self::NoDifficulty => "no [EASY]/[MEDIUM]/[HARD] header before it",
        }
    }
}

impl QuestionBuilder {
    pub fn new(difficulty: Option<Difficulty>, line: usize, text: &str) -> Self {
        Self {
            difficulty,
            line,
            text: text.trim().to_string(),
            question_type: None,
            options: Vec::new(),
            correct_answer: None,
            answer_text: None,
            explanation: String::new(),
        }
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Returns false when the type name is not recognized; the block keeps
    /// its previous (or default) type.
    pub fn set_type(&mut self, raw: &str) -> bool {
        match parse_question_type(raw) {
            Some(t) => {
                self.question_type = Some(t);
                true
            }
            None => false,
        }
    }

    pub fn set_options(&mut self, raw: &str) {
        self.options = raw.split(',').map(|o| o.trim().to_string()).collect();
    }

    /// Returns false when the value is not a non-negative integer.
    pub fn set_correct(&mut self, raw: &str) -> bool {
        match raw.trim().parse::<usize>() {
            Ok(idx) => {
                self.correct_answer = Some(idx);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_answer(&mut self, raw: &str) {
        self.answer_text = Some(raw.trim().to_string());
    }

    pub fn set_explanation(&mut self, raw: &str) {
        self.explanation = raw.trim().to_string();
    }

    /// Turns the block into a record with a fresh id. Blocks without question
    /// text or explanation are rejected; the caller drops them.
    pub fn build(self) -> Result<QuestionRecord, BuildRejection> {
        if self.text.is_empty() {
            return Err(BuildRejection::MissingText);
        }
        if self.explanation.is_empty() {
            return Err(BuildRejection::MissingExplanation);
        }
        let difficulty = self.difficulty.ok_or(BuildRejection::NoDifficulty)?;

        let correct_answer = self.correct_answer.unwrap_or(0);
        let body = match self.question_type.unwrap_or(QuestionType::Multiple) {
            QuestionType::Multiple => QuestionBody::Multiple {
                options: self.options,
                correct_answer,
            },
            QuestionType::TrueFalse => QuestionBody::TrueFalse { correct_answer },
            QuestionType::Single => QuestionBody::Single {
                answer_text: self.answer_text.unwrap_or_default(),
            },
        };

        Ok(QuestionRecord {
            id: Uuid::new_v4(),
            difficulty,
            text: self.text,
            explanation: self.explanation,
            body,
        })
    }
}

pub fn parse_question_type(raw: &str) -> Option<QuestionType> {
    match normalize_key(raw).as_str() {
        "multiple" | "multiplechoice" | "mcq" => Some(QuestionType::Multiple),
        "single" | "short" | "shortanswer" | "text" => Some(QuestionType::Single),
        "truefalse" | "tf" | "boolean" => Some(QuestionType::TrueFalse),
        _ => None,
    }
}
