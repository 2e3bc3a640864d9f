use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::course::{Category, CourseDraft};
use crate::models::difficulty::{Difficulty, DifficultySettings};
use crate::models::question::QuestionRecord;
use crate::services::question_builder::QuestionBuilder;
use crate::utils::normalize::{
    match_basic_field, match_setting_field, normalize_key, BasicField, SettingField,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// 1-based source line, when the warning is tied to one.
    pub line: Option<usize>,
    pub message: String,
}

impl ParseWarning {
    fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedCourse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub max_marks: Option<u32>,
    pub category_id: Option<String>,
    pub is_paid: Option<bool>,
    pub price: Option<f64>,
    pub difficulties: Vec<Difficulty>,
    pub settings: BTreeMap<Difficulty, DifficultySettings>,
    pub questions: BTreeMap<Difficulty, Vec<QuestionRecord>>,
    pub warnings: Vec<ParseWarning>,
    settings_lines: BTreeMap<Difficulty, usize>,
}

impl ParsedCourse {
    /// Replaces the course content of `draft` with the parsed values. The
    /// thumbnail and video settings are left alone. Settings and questions for
    /// tiers that were not selected are discarded.
    pub fn apply_to(self, draft: &mut CourseDraft) -> Vec<ParseWarning> {
        let mut warnings = self.warnings;

        draft.title = self.title.unwrap_or_default();
        draft.description = self.description.unwrap_or_default();
        draft.max_marks = self.max_marks.unwrap_or(0);
        draft.category_id = self.category_id;
        draft.is_paid = self.is_paid.unwrap_or(false);
        draft.price = self.price.unwrap_or(0.0);

        draft.difficulties.clear();
        draft.settings.clear();
        draft.questions.clear();
        for difficulty in self.difficulties {
            draft.select_difficulty(difficulty);
        }

        for (difficulty, settings) in self.settings {
            if draft.is_selected(difficulty) {
                draft.settings.insert(difficulty, settings);
            } else {
                warnings.push(ParseWarning {
                    line: self.settings_lines.get(&difficulty).copied(),
                    message: format!(
                        "Settings for '{}' ignored: difficulty is not listed in DIFFICULTY LEVELS",
                        difficulty
                    ),
                });
            }
        }

        for (difficulty, questions) in self.questions {
            if draft.is_selected(difficulty) {
                draft
                    .questions
                    .entry(difficulty)
                    .or_default()
                    .extend(questions);
            } else {
                warnings.push(ParseWarning {
                    line: None,
                    message: format!(
                        "{} question(s) for '{}' ignored: difficulty is not listed in DIFFICULTY LEVELS",
                        questions.len(),
                        difficulty
                    ),
                });
            }
        }

        warnings
    }

    pub fn question_count(&self) -> usize {
        self.questions.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Basic,
    DifficultySettings,
    Questions,
}

struct CourseParser<'a> {
    categories: &'a [Category],
    section: Section,
    settings_block: Option<Difficulty>,
    current_difficulty: Option<Difficulty>,
    pending: Option<QuestionBuilder>,
    out: ParsedCourse,
}

/// Parses an import document. `categories` is used to resolve a category
/// given by name to its id.
///
/// ```text
/// COURSE NAME = Algebra basics
/// MAX MARKS = 10
/// DIFFICULTY LEVELS = easy
///
/// DIFFICULTY SETTINGS:
/// easy:
///   marks per question = 2
///   max questions = 5
///   min time = 10
///   max time = 60
///
/// QUESTIONS:
/// [EASY]
/// Q: What is 2+2?
/// TYPE: single
/// ANSWER: 4
/// EXPLANATION: basic arithmetic fact
/// ```
///
/// Parsing never fails. Unrecognized lines are skipped and question blocks
/// missing their text or explanation are dropped; both produce a
/// [`ParseWarning`]. Presence and range checks are left to the validator.
pub fn parse_course(text: &str, categories: &[Category]) -> ParsedCourse {
    let mut parser = CourseParser {
        categories,
        section: Section::Basic,
        settings_block: None,
        current_difficulty: None,
        pending: None,
        out: ParsedCourse::default(),
    };

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        parser.feed(idx + 1, line);
    }
    parser.flush();

    tracing::debug!(
        difficulties = parser.out.difficulties.len(),
        questions = parser.out.question_count(),
        warnings = parser.out.warnings.len(),
        "parsed course import"
    );
    parser.out
}

impl CourseParser<'_> {
    fn feed(&mut self, line_no: usize, line: &str) {
        if let Some(inner) = bracket_header(line) {
            self.flush();
            self.section = Section::Questions;
            self.current_difficulty = match inner.parse::<Difficulty>() {
                Ok(d) => Some(d),
                Err(_) => {
                    self.warn(line_no, format!("Unknown difficulty header '[{}]'", inner));
                    None
                }
            };
            return;
        }

        if line.ends_with(':') && !line.contains('=') {
            match normalize_key(line).as_str() {
                "difficultysettings" => {
                    self.flush();
                    self.section = Section::DifficultySettings;
                    self.settings_block = None;
                    return;
                }
                "questions" => {
                    self.flush();
                    self.section = Section::Questions;
                    return;
                }
                _ => {}
            }
        }

        match self.section {
            Section::Basic => self.basic_line(line_no, line),
            Section::DifficultySettings => self.settings_line(line_no, line),
            Section::Questions => self.question_line(line_no, line),
        }
    }

    fn basic_line(&mut self, line_no: usize, line: &str) {
        let Some((key, value)) = line.split_once('=') else {
            self.warn(line_no, "Expected 'KEY = value'");
            return;
        };
        let value = value.trim();

        let Some(field) = match_basic_field(key) else {
            self.warn(line_no, format!("Unknown field '{}'", key.trim()));
            return;
        };

        match field {
            BasicField::Title => self.out.title = Some(value.to_string()),
            BasicField::Description => self.out.description = Some(value.to_string()),
            BasicField::MaxMarks => self.out.max_marks = Some(parse_int_or_zero(value)),
            BasicField::Category => {
                self.out.category_id = (!value.is_empty()).then(|| self.resolve_category(value))
            }
            BasicField::IsPaid => self.out.is_paid = Some(parse_flag(value)),
            BasicField::Price => self.out.price = Some(parse_float_or_zero(value)),
            BasicField::Difficulties => {
                for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                    match name.parse::<Difficulty>() {
                        Ok(d) if !self.out.difficulties.contains(&d) => {
                            self.out.difficulties.push(d)
                        }
                        Ok(_) => {}
                        Err(e) => self.warn(line_no, e),
                    }
                }
            }
        }
    }

    fn settings_line(&mut self, line_no: usize, line: &str) {
        let Some((key, value)) = line.split_once('=') else {
            let name = line.trim_end_matches(':').trim();
            match name.parse::<Difficulty>() {
                Ok(d) => {
                    self.settings_block = Some(d);
                    self.out.settings.entry(d).or_default();
                    self.out.settings_lines.entry(d).or_insert(line_no);
                }
                Err(e) => {
                    self.settings_block = None;
                    self.warn(line_no, e);
                }
            }
            return;
        };

        let Some(difficulty) = self.settings_block else {
            self.warn(line_no, "Setting outside of a difficulty block");
            return;
        };
        let Some(field) = match_setting_field(key) else {
            self.warn(line_no, format!("Unknown setting '{}'", key.trim()));
            return;
        };
        let Some(number) = parse_positive(value) else {
            self.warn(
                line_no,
                format!("Ignoring non-positive value '{}' for '{}'", value.trim(), key.trim()),
            );
            return;
        };

        let settings = self.out.settings.entry(difficulty).or_default();
        match field {
            SettingField::MarksPerQuestion => settings.marks_per_question = Some(number),
            SettingField::MaxQuestions => settings.max_questions = Some(number),
            SettingField::MinTime => settings.min_time_seconds = Some(number),
            SettingField::MaxTime => settings.max_time_seconds = Some(number),
        }
    }

    fn question_line(&mut self, line_no: usize, line: &str) {
        let Some((key, value)) = line.split_once(':') else {
            self.warn(line_no, "Unrecognized line in QUESTIONS section");
            return;
        };
        let key = normalize_key(key);

        if key == "q" || key == "question" {
            self.flush();
            self.pending = Some(QuestionBuilder::new(self.current_difficulty, line_no, value));
            return;
        }

        let Some(pending) = self.pending.as_mut() else {
            self.warn(line_no, "Line outside of a 'Q:' block");
            return;
        };

        match key.as_str() {
            "type" => {
                if !pending.set_type(value) {
                    self.warn(line_no, format!("Unknown question type '{}'", value.trim()));
                }
            }
            "options" => pending.set_options(value),
            "correct" | "correctanswer" | "correctindex" => {
                if !pending.set_correct(value) {
                    self.warn(line_no, format!("Invalid answer index '{}'", value.trim()));
                }
            }
            "answer" | "answertext" => pending.set_answer(value),
            "explanation" => pending.set_explanation(value),
            other => self.warn(line_no, format!("Unknown question field '{}'", other)),
        }
    }

    fn flush(&mut self) {
        let Some(builder) = self.pending.take() else {
            return;
        };
        let line = builder.line;
        match builder.build() {
            Ok(question) => self
                .out
                .questions
                .entry(question.difficulty)
                .or_default()
                .push(question),
            Err(reason) => self.warn(
                line,
                format!("Question dropped: {}", reason.describe()),
            ),
        }
    }

    fn resolve_category(&self, value: &str) -> String {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(value))
            .map(|c| c.id.clone())
            .unwrap_or_else(|| value.to_string())
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.out.warnings.push(ParseWarning::at(line, message));
    }
}

fn bracket_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

// Reads the leading number and ignores whatever follows it ("30 seconds",
// "49.99 USD"). No leading number means 0.
fn parse_float_or_zero(value: &str) -> f64 {
    let text = value.trim();
    text[..numeric_prefix_len(text)]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 || has_digits {
            has_digits |= frac_end > end + 1;
            end = frac_end;
        }
    }
    if !has_digits {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    end
}

fn parse_int_or_zero(value: &str) -> u32 {
    let v = parse_float_or_zero(value);
    if v >= 1.0 {
        v.trunc().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

fn parse_positive(value: &str) -> Option<u32> {
    Some(parse_int_or_zero(value)).filter(|v| *v > 0)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        normalize_key(value).as_str(),
        "true" | "yes" | "y" | "paid"
    ) || value.trim() == "1"
}
