use serde::Serialize;

use crate::models::course::CourseDraft;
use crate::models::difficulty::Difficulty;
use crate::models::question::{
    QuestionBody, QuestionRecord, MAX_ANSWER_LEN, MAX_OPTIONS, MAX_QUESTION_LEN,
    MIN_EXPLANATION_LEN, MIN_OPTIONS, MIN_QUESTION_LEN,
};
use crate::models::validation::ValidationErrorSet;
use crate::models::wizard::WizardStep;

pub const TITLE_LEN: (usize, usize) = (2, 100);
pub const DESCRIPTION_LEN: (usize, usize) = (5, 800);
pub const MAX_MARKS_RANGE: (u32, u32) = (1, 100);
pub const MAX_PRICE: f64 = 50_000.0;

/// Outcome of validating every step in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Earliest step with errors; `None` when the draft is ready to save.
    pub first_failing: Option<WizardStep>,
    /// Errors of `first_failing` only.
    pub errors: ValidationErrorSet,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.first_failing.is_none()
    }

    /// Where the wizard should take the user.
    pub fn target_step(&self) -> WizardStep {
        self.first_failing.unwrap_or(WizardStep::PreviewAndSave)
    }
}

pub fn validate_step(draft: &CourseDraft, step: WizardStep) -> ValidationErrorSet {
    let mut errors = ValidationErrorSet::new();
    match step {
        WizardStep::BasicInfo => basic_info(draft, &mut errors),
        WizardStep::DifficultySelection => difficulty_selection(draft, &mut errors),
        WizardStep::MarksAndDuration => marks_and_duration(draft, &mut errors),
        WizardStep::Questions => questions(draft, &mut errors),
        WizardStep::VideoContent => video_content(draft, &mut errors),
        WizardStep::PreviewAndSave => return validate_all(draft).errors,
    }
    errors
}

/// Validates steps 1-5 in order and stops at the first one that fails.
pub fn validate_all(draft: &CourseDraft) -> ValidationReport {
    for step in WizardStep::validated() {
        let errors = validate_step(draft, step);
        if !errors.is_empty() {
            return ValidationReport {
                first_failing: Some(step),
                errors,
            };
        }
    }
    ValidationReport {
        first_failing: None,
        errors: ValidationErrorSet::new(),
    }
}

fn check_length(
    errors: &mut ValidationErrorSet,
    key: &str,
    value: &str,
    what: &str,
    (min, max): (usize, usize),
) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.add(key, format!("{} is required", what));
    } else if len < min || len > max {
        errors.add(
            key,
            format!("{} must be between {} and {} characters", what, min, max),
        );
    }
}

fn basic_info(draft: &CourseDraft, errors: &mut ValidationErrorSet) {
    check_length(errors, "title", &draft.title, "Course name", TITLE_LEN);
    check_length(
        errors,
        "description",
        &draft.description,
        "Course description",
        DESCRIPTION_LEN,
    );

    let (min_marks, max_marks) = MAX_MARKS_RANGE;
    if draft.max_marks == 0 {
        errors.add("max_marks", "Max marks is required");
    } else if draft.max_marks < min_marks || draft.max_marks > max_marks {
        errors.add(
            "max_marks",
            format!("Max marks must be between {} and {}", min_marks, max_marks),
        );
    }

    if draft.is_paid {
        if !(draft.price > 0.0) {
            errors.add("price", "Price must be greater than 0 for paid courses");
        } else if draft.price > MAX_PRICE {
            errors.add("price", format!("Price cannot exceed {}", MAX_PRICE));
        }
    }

    if draft.thumbnail.is_none() {
        errors.add("thumbnail", "Course thumbnail is required");
    }
}

fn difficulty_selection(draft: &CourseDraft, errors: &mut ValidationErrorSet) {
    if draft.difficulties.is_empty() {
        errors.add("difficulties", "Select at least one difficulty level");
    }
}

fn marks_and_duration(draft: &CourseDraft, errors: &mut ValidationErrorSet) {
    for &difficulty in &draft.difficulties {
        let settings = draft.settings_for(difficulty).cloned().unwrap_or_default();
        let label = difficulty.label();
        let key = |field: &str| format!("settings.{}.{}", difficulty, field);

        let required = [
            ("marks_per_question", settings.marks_per_question, "marks per question"),
            ("max_questions", settings.max_questions, "max questions"),
            ("min_time_seconds", settings.min_time_seconds, "minimum time"),
            ("max_time_seconds", settings.max_time_seconds, "maximum time"),
        ];
        for (field, value, what) in required {
            if value.is_none() {
                errors.add(key(field), format!("{}: {} is required", label, what));
            }
        }
        if !settings.is_complete() {
            continue;
        }

        let marks = settings.marks_per_question.unwrap_or(0);
        let count = settings.max_questions.unwrap_or(0);
        let min_time = settings.min_time_seconds.unwrap_or(0);
        let max_time = settings.max_time_seconds.unwrap_or(0);

        if marks < 1 {
            errors.add(
                key("marks_per_question"),
                format!("{}: marks per question must be at least 1", label),
            );
        }
        if count < 1 {
            errors.add(
                key("max_questions"),
                format!("{}: max questions must be at least 1", label),
            );
        }
        if min_time < 1 {
            errors.add(
                key("min_time_seconds"),
                format!("{}: minimum time must be at least 1 second", label),
            );
        }
        if max_time <= min_time {
            errors.add(
                key("max_time_seconds"),
                format!("{}: maximum time must be greater than minimum time", label),
            );
        }

        let total = marks.saturating_mul(count);
        if total > draft.max_marks {
            errors.add(
                key("total"),
                format!(
                    "{}: total marks ({}) exceed the course max marks ({})",
                    label, total, draft.max_marks
                ),
            );
        }
    }

    if !errors.is_empty() {
        return;
    }

    let sum = draft.configured_marks();
    if sum > draft.max_marks {
        errors.add(
            "marks_total",
            format!(
                "Total marks across difficulties ({}) exceed the course max marks ({})",
                sum, draft.max_marks
            ),
        );
    } else if sum < draft.max_marks {
        errors.add(
            "marks_total",
            format!(
                "Total marks across difficulties ({}) fall short of the course max marks ({})",
                sum, draft.max_marks
            ),
        );
    }
}

fn questions(draft: &CourseDraft, errors: &mut ValidationErrorSet) {
    for &difficulty in &draft.difficulties {
        let list = draft.questions_for(difficulty);
        if let Some(required) = draft
            .settings_for(difficulty)
            .and_then(|s| s.max_questions)
        {
            if list.len() < required as usize {
                errors.add(
                    format!("questions.{}", difficulty),
                    format!(
                        "{} requires at least {} questions (currently {})",
                        difficulty.label(),
                        required,
                        list.len()
                    ),
                );
            }
        }

        for (idx, question) in list.iter().enumerate() {
            check_question(errors, difficulty, idx, question);
        }
    }
}

fn check_question(
    errors: &mut ValidationErrorSet,
    difficulty: Difficulty,
    idx: usize,
    question: &QuestionRecord,
) {
    let key = |field: &str| format!("questions.{}.{}.{}", difficulty, idx, field);
    let n = idx + 1;

    let text_len = question.text.trim().chars().count();
    if text_len < MIN_QUESTION_LEN {
        errors.add(
            key("text"),
            format!("Question {}: text must be at least {} characters", n, MIN_QUESTION_LEN),
        );
    } else if text_len > MAX_QUESTION_LEN {
        errors.add(
            key("text"),
            format!("Question {}: text cannot exceed {} characters", n, MAX_QUESTION_LEN),
        );
    }

    if question.explanation.trim().chars().count() < MIN_EXPLANATION_LEN {
        errors.add(
            key("explanation"),
            format!(
                "Question {}: explanation must be at least {} characters",
                n, MIN_EXPLANATION_LEN
            ),
        );
    }

    match &question.body {
        QuestionBody::Multiple {
            options,
            correct_answer,
        } => {
            if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
                errors.add(
                    key("options"),
                    format!(
                        "Question {}: multiple choice needs between {} and {} options",
                        n, MIN_OPTIONS, MAX_OPTIONS
                    ),
                );
            } else if options.iter().any(|o| o.trim().is_empty()) {
                errors.add(key("options"), format!("Question {}: all options must be filled", n));
            } else if *correct_answer >= options.len() {
                errors.add(
                    key("correct_answer"),
                    format!("Question {}: correct answer must reference one of the options", n),
                );
            }
        }
        QuestionBody::TrueFalse { correct_answer } => {
            if *correct_answer > 1 {
                errors.add(
                    key("correct_answer"),
                    format!("Question {}: correct answer must be True (0) or False (1)", n),
                );
            }
        }
        QuestionBody::Single { answer_text } => {
            let len = answer_text.trim().chars().count();
            if len == 0 {
                errors.add(key("answer_text"), format!("Question {}: answer text is required", n));
            } else if len > MAX_ANSWER_LEN {
                errors.add(
                    key("answer_text"),
                    format!("Question {}: answer cannot exceed {} characters", n, MAX_ANSWER_LEN),
                );
            }
        }
    }
}

fn video_content(draft: &CourseDraft, errors: &mut ValidationErrorSet) {
    if !draft.is_paid || !draft.video.is_enabled() {
        return;
    }
    for (idx, link) in draft.video.filled_links() {
        let well_formed = url::Url::parse(link.url.trim())
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !well_formed {
            errors.add(
                format!("video.links.{}.url", idx),
                format!("Video link {}: enter a valid http(s) URL", idx + 1),
            );
        }
    }
}
