use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::normalize::normalize_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(format!(
                "Unknown difficulty '{}'. Must be one of: easy, medium, hard",
                s.trim()
            )),
        }
    }
}

/// Scoring and timer settings of one selected tier. `None` means the value
/// has not been specified yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultySettings {
    pub marks_per_question: Option<u32>,
    pub max_questions: Option<u32>,
    pub min_time_seconds: Option<u32>,
    pub max_time_seconds: Option<u32>,
}

impl DifficultySettings {
    pub fn total_marks(&self) -> Option<u32> {
        let marks = self.marks_per_question?;
        let count = self.max_questions?;
        Some(marks.saturating_mul(count))
    }

    pub fn is_complete(&self) -> bool {
        self.marks_per_question.is_some()
            && self.max_questions.is_some()
            && self.min_time_seconds.is_some()
            && self.max_time_seconds.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_difficulty_names_loosely() {
        assert_eq!("EASY".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" Medium ".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert_eq!("[hard]".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn total_marks_requires_both_factors() {
        let mut settings = DifficultySettings {
            marks_per_question: Some(2),
            ..Default::default()
        };
        assert_eq!(settings.total_marks(), None);
        settings.max_questions = Some(5);
        assert_eq!(settings.total_marks(), Some(10));
        assert!(!settings.is_complete());
    }
}
