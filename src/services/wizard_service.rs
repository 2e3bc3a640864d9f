use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dto::wizard_dto::{AddQuestionPayload, BasicInfoPayload, TierSettingsPayload};
use crate::error::{Error, Result};
use crate::models::course::{CourseDraft, ImageRef};
use crate::models::difficulty::{Difficulty, DifficultySettings};
use crate::models::question::QuestionRecord;
use crate::models::validation::ValidationErrorSet;
use crate::models::video::VideoContent;
use crate::models::wizard::WizardStep;
use crate::services::course_parser::{ParseWarning, ParsedCourse};
use crate::services::validation_service::{validate_all, validate_step, ValidationReport};

/// One course-creation wizard: the draft being built plus navigation state.
#[derive(Debug, Clone)]
pub struct WizardSession {
    pub id: Uuid,
    pub step: WizardStep,
    pub draft: CourseDraft,
    /// Tier whose questions are being edited in the Questions step.
    pub editing_difficulty: Option<Difficulty>,
    /// Errors of the last failed transition or import.
    pub errors: ValidationErrorSet,
    pub import_warnings: Vec<ParseWarning>,
    /// Set while a submission is in flight; the draft is frozen meanwhile.
    pub submitting: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub report: ValidationReport,
    pub warnings: Vec<ParseWarning>,
    pub questions_imported: usize,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            step: WizardStep::BasicInfo,
            draft: CourseDraft::default(),
            editing_difficulty: None,
            errors: ValidationErrorSet::new(),
            import_warnings: Vec::new(),
            submitting: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.submitting {
            return Err(Error::Conflict(
                "A submission is in progress for this course".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_selected(&self, difficulty: Difficulty) -> Result<()> {
        if !self.draft.is_selected(difficulty) {
            return Err(Error::NotFound(format!(
                "Difficulty '{}' is not selected for this course",
                difficulty
            )));
        }
        Ok(())
    }

    fn enter(&mut self, step: WizardStep) {
        if step == WizardStep::Questions {
            let still_selected = self
                .editing_difficulty
                .map(|d| self.draft.is_selected(d))
                .unwrap_or(false);
            if !still_selected {
                self.editing_difficulty = self.draft.difficulties.first().copied();
            }
        }
        self.step = step;
    }

    /// Validates the current step and moves forward. Free courses skip the
    /// video step. On failure the session stays put and keeps the errors.
    pub fn next(&mut self) -> Result<WizardStep> {
        self.ensure_idle()?;
        let current = self.step;
        let errors = validate_step(&self.draft, current);
        self.touch();
        if !errors.is_empty() {
            debug!(session = %self.id, step = current.to_number(), errors = errors.len(), "step validation failed");
            self.errors = errors.clone();
            return Err(Error::StepValidation {
                step: current,
                errors,
            });
        }

        self.errors = ValidationErrorSet::new();
        let target = match current {
            WizardStep::Questions if !self.draft.is_paid => WizardStep::PreviewAndSave,
            WizardStep::PreviewAndSave => WizardStep::PreviewAndSave,
            step => WizardStep::from_number(step.to_number() + 1).unwrap_or(step),
        };
        self.enter(target);
        debug!(session = %self.id, from = current.to_number(), to = target.to_number(), "wizard advanced");
        Ok(target)
    }

    /// Moves back one step without validation; free courses skip the video
    /// step on the way back too.
    pub fn prev(&mut self) -> Result<WizardStep> {
        self.ensure_idle()?;
        let target = match self.step {
            WizardStep::BasicInfo => WizardStep::BasicInfo,
            WizardStep::PreviewAndSave if !self.draft.is_paid => WizardStep::Questions,
            step => WizardStep::from_number(step.to_number() - 1).unwrap_or(step),
        };
        self.errors = ValidationErrorSet::new();
        self.enter(target);
        self.touch();
        Ok(target)
    }

    /// Replaces the course content with a parsed import document and routes to
    /// the earliest failing step, or to the preview when everything passes.
    pub fn apply_import(&mut self, parsed: ParsedCourse) -> Result<ImportOutcome> {
        self.ensure_idle()?;
        if self.draft.thumbnail.is_none() {
            return Err(Error::BadRequest(
                "Attach a course thumbnail before importing a course file".to_string(),
            ));
        }

        let questions_imported = parsed.question_count();
        let warnings = parsed.apply_to(&mut self.draft);
        for w in &warnings {
            warn!(session = %self.id, line = ?w.line, "import: {}", w.message);
        }

        let report = validate_all(&self.draft);
        self.errors = report.errors.clone();
        self.import_warnings = warnings.clone();
        self.editing_difficulty = None;
        self.enter(report.target_step());
        self.touch();

        info!(
            session = %self.id,
            questions = questions_imported,
            warnings = warnings.len(),
            step = self.step.to_number(),
            "course file imported"
        );

        Ok(ImportOutcome {
            report,
            warnings,
            questions_imported,
        })
    }

    pub fn update_basic_info(&mut self, payload: BasicInfoPayload) -> Result<()> {
        self.ensure_idle()?;
        let draft = &mut self.draft;
        if let Some(title) = payload.title {
            draft.title = title;
        }
        if let Some(description) = payload.description {
            draft.description = description;
        }
        if let Some(max_marks) = payload.max_marks {
            draft.max_marks = max_marks;
        }
        if let Some(category_id) = payload.category_id {
            draft.category_id = Some(category_id);
        }
        if let Some(is_paid) = payload.is_paid {
            draft.is_paid = is_paid;
            if !is_paid {
                draft.price = 0.0;
            }
        }
        if let Some(price) = payload.price {
            draft.price = price;
        }
        self.touch();
        Ok(())
    }

    pub fn set_thumbnail(&mut self, image: ImageRef) -> Result<Option<ImageRef>> {
        self.ensure_idle()?;
        self.touch();
        Ok(self.draft.thumbnail.replace(image))
    }

    /// Returns whether the tier is selected afterwards.
    pub fn toggle_difficulty(&mut self, difficulty: Difficulty) -> Result<bool> {
        self.ensure_idle()?;
        let selected = self.draft.toggle_difficulty(difficulty);
        if !selected && self.editing_difficulty == Some(difficulty) {
            self.editing_difficulty = self.draft.difficulties.first().copied();
        }
        self.touch();
        Ok(selected)
    }

    pub fn update_settings(
        &mut self,
        difficulty: Difficulty,
        payload: TierSettingsPayload,
    ) -> Result<()> {
        self.ensure_idle()?;
        self.ensure_selected(difficulty)?;
        self.draft.settings.insert(
            difficulty,
            DifficultySettings {
                marks_per_question: payload.marks_per_question,
                max_questions: payload.max_questions,
                min_time_seconds: payload.min_time_seconds,
                max_time_seconds: payload.max_time_seconds,
            },
        );
        self.touch();
        Ok(())
    }

    pub fn select_editing_difficulty(&mut self, difficulty: Difficulty) -> Result<()> {
        self.ensure_selected(difficulty)?;
        self.editing_difficulty = Some(difficulty);
        self.touch();
        Ok(())
    }

    pub fn add_question(
        &mut self,
        difficulty: Difficulty,
        payload: AddQuestionPayload,
    ) -> Result<QuestionRecord> {
        self.ensure_idle()?;
        self.ensure_selected(difficulty)?;
        let record = payload.into_record(difficulty);
        self.draft.add_question(record.clone());
        self.touch();
        Ok(record)
    }

    pub fn remove_question(&mut self, difficulty: Difficulty, id: Uuid) -> Result<QuestionRecord> {
        self.ensure_idle()?;
        let removed = self
            .draft
            .remove_question(difficulty, id)
            .ok_or_else(|| Error::NotFound(format!("Question {} not found", id)))?;
        self.touch();
        Ok(removed)
    }

    pub fn clear_questions(&mut self, difficulty: Difficulty) -> Result<usize> {
        self.ensure_idle()?;
        self.ensure_selected(difficulty)?;
        let removed = self.draft.clear_questions(difficulty);
        self.touch();
        Ok(removed)
    }

    pub fn set_video(&mut self, video: VideoContent) -> Result<()> {
        self.ensure_idle()?;
        self.draft.video = video;
        self.touch();
        Ok(())
    }

    /// Freezes the session for submission and hands out the draft to send.
    pub fn begin_submission(&mut self) -> Result<CourseDraft> {
        self.ensure_idle()?;
        if self.step != WizardStep::PreviewAndSave {
            return Err(Error::BadRequest(format!(
                "Courses can only be saved from step {} ({})",
                WizardStep::PreviewAndSave.to_number(),
                WizardStep::PreviewAndSave.label()
            )));
        }
        let report = validate_all(&self.draft);
        if let Some(step) = report.first_failing {
            self.errors = report.errors.clone();
            return Err(Error::StepValidation {
                step,
                errors: report.errors,
            });
        }
        self.submitting = true;
        self.touch();
        Ok(self.draft.clone())
    }

    /// Unfreezes the session. A successful submission starts over with an
    /// empty draft; a failed one leaves the draft exactly as it was.
    pub fn finish_submission(&mut self, succeeded: bool) {
        self.submitting = false;
        if succeeded {
            self.step = WizardStep::BasicInfo;
            self.draft = CourseDraft::default();
            self.editing_difficulty = None;
            self.errors = ValidationErrorSet::new();
            self.import_warnings.clear();
        }
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;
    use crate::services::course_parser::parse_course;

    fn thumbnail() -> ImageRef {
        ImageRef {
            file_name: "cover.png".into(),
            content_type: "image/png".into(),
            path: "uploads/thumbnails/cover.png".into(),
            size_bytes: 64,
        }
    }

    fn basic(max_marks: u32, is_paid: bool) -> BasicInfoPayload {
        BasicInfoPayload {
            title: Some("Arithmetic".into()),
            description: Some("Numbers and operations".into()),
            max_marks: Some(max_marks),
            category_id: None,
            is_paid: Some(is_paid),
            price: is_paid.then_some(25.0),
        }
    }

    fn tier(marks: u32, count: u32) -> TierSettingsPayload {
        TierSettingsPayload {
            marks_per_question: Some(marks),
            max_questions: Some(count),
            min_time_seconds: Some(10),
            max_time_seconds: Some(60),
        }
    }

    fn question(n: usize) -> AddQuestionPayload {
        AddQuestionPayload {
            question_type: QuestionType::TrueFalse,
            question: format!("Statement number {} is true", n),
            explanation: "Explained in chapter one".into(),
            options: Vec::new(),
            correct_answer: Some(0),
            answer_text: None,
        }
    }

    /// A session sitting on the Questions step with a complete question set.
    fn at_questions(is_paid: bool) -> WizardSession {
        let mut s = WizardSession::new();
        s.set_thumbnail(thumbnail()).unwrap();
        s.update_basic_info(basic(4, is_paid)).unwrap();
        assert_eq!(s.next().unwrap(), WizardStep::DifficultySelection);
        s.toggle_difficulty(Difficulty::Medium).unwrap();
        assert_eq!(s.next().unwrap(), WizardStep::MarksAndDuration);
        s.update_settings(Difficulty::Medium, tier(2, 2)).unwrap();
        assert_eq!(s.next().unwrap(), WizardStep::Questions);
        s.add_question(Difficulty::Medium, question(1)).unwrap();
        s.add_question(Difficulty::Medium, question(2)).unwrap();
        s
    }

    #[test]
    fn failed_next_stays_and_keeps_errors() {
        let mut s = WizardSession::new();
        let err = s.next().unwrap_err();
        assert!(matches!(err, Error::StepValidation { step: WizardStep::BasicInfo, .. }));
        assert_eq!(s.step, WizardStep::BasicInfo);
        assert!(s.errors.contains("title"));
        assert!(s.errors.contains("thumbnail"));
    }

    #[test]
    fn errors_are_replaced_not_merged() {
        let mut s = WizardSession::new();
        let _ = s.next();
        assert!(s.errors.contains("title"));
        s.set_thumbnail(thumbnail()).unwrap();
        s.update_basic_info(basic(4, false)).unwrap();
        s.draft.description.clear();
        let _ = s.next();
        assert!(!s.errors.contains("title"));
        assert!(s.errors.contains("description"));
    }

    #[test]
    fn entering_questions_seeds_editing_difficulty() {
        let s = at_questions(false);
        assert_eq!(s.editing_difficulty, Some(Difficulty::Medium));
    }

    #[test]
    fn free_course_skips_video_both_ways() {
        let mut s = at_questions(false);
        assert_eq!(s.next().unwrap(), WizardStep::PreviewAndSave);
        assert_eq!(s.prev().unwrap(), WizardStep::Questions);
    }

    #[test]
    fn paid_course_visits_video() {
        let mut s = at_questions(true);
        assert_eq!(s.next().unwrap(), WizardStep::VideoContent);
        assert_eq!(s.next().unwrap(), WizardStep::PreviewAndSave);
        assert_eq!(s.prev().unwrap(), WizardStep::VideoContent);
    }

    #[test]
    fn prev_from_first_step_stays() {
        let mut s = WizardSession::new();
        assert_eq!(s.prev().unwrap(), WizardStep::BasicInfo);
    }

    #[test]
    fn toggling_tier_off_and_on_forgets_settings() {
        let mut s = at_questions(false);
        assert!(!s.toggle_difficulty(Difficulty::Medium).unwrap());
        assert_eq!(s.editing_difficulty, None);
        assert!(s.toggle_difficulty(Difficulty::Medium).unwrap());
        assert_eq!(
            s.draft.settings_for(Difficulty::Medium),
            Some(&DifficultySettings::default())
        );
        assert!(s.draft.questions_for(Difficulty::Medium).is_empty());
    }

    #[test]
    fn import_requires_thumbnail() {
        let mut s = WizardSession::new();
        let err = s
            .apply_import(parse_course("COURSE NAME = X\n", &[]))
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(s.draft, CourseDraft::default());
    }

    #[test]
    fn import_routes_to_first_failing_step() {
        let mut s = WizardSession::new();
        s.set_thumbnail(thumbnail()).unwrap();
        let text = "COURSE NAME = Arithmetic\nCOURSE DESCRIPTION = Numbers and operations\nMAX MARKS = 10\nDIFFICULTY LEVELS = easy\nDIFFICULTY SETTINGS:\neasy:\n  marks per question = 2\n  max questions = 5\n  min time = 1\n  max time = 60\nQUESTIONS:\n[EASY]\nQ: What is 2+2?\nTYPE: single\nANSWER: 4\nEXPLANATION: basic arithmetic fact\n";
        let outcome = s.apply_import(parse_course(text, &[])).unwrap();
        assert_eq!(outcome.questions_imported, 1);
        assert_eq!(outcome.report.first_failing, Some(WizardStep::Questions));
        assert_eq!(s.step, WizardStep::Questions);
        assert_eq!(s.editing_difficulty, Some(Difficulty::Easy));
        assert!(s.errors.contains("questions.easy"));
    }

    #[test]
    fn submission_freezes_then_resets_on_success() {
        let mut s = at_questions(false);
        s.next().unwrap();
        let draft = s.begin_submission().unwrap();
        assert_eq!(draft.question_count(), 2);
        assert!(matches!(s.begin_submission(), Err(Error::Conflict(_))));
        assert!(matches!(
            s.toggle_difficulty(Difficulty::Easy),
            Err(Error::Conflict(_))
        ));

        s.finish_submission(false);
        assert_eq!(s.step, WizardStep::PreviewAndSave);
        assert_eq!(s.draft, draft);

        s.begin_submission().unwrap();
        s.finish_submission(true);
        assert_eq!(s.step, WizardStep::BasicInfo);
        assert_eq!(s.draft, CourseDraft::default());
    }

    #[test]
    fn submission_only_from_preview() {
        let mut s = at_questions(false);
        assert!(matches!(s.begin_submission(), Err(Error::BadRequest(_))));
    }
}
