use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::difficulty::{Difficulty, DifficultySettings};
use super::question::QuestionRecord;
use super::video::VideoContent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Handle to an uploaded image stored under the uploads directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub file_name: String,
    pub content_type: String,
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    /// `0` when missing or unparseable.
    pub max_marks: u32,
    pub category_id: Option<String>,
    pub is_paid: bool,
    pub price: f64,
    pub thumbnail: Option<ImageRef>,
    /// Selected tiers in selection order.
    pub difficulties: Vec<Difficulty>,
    pub settings: BTreeMap<Difficulty, DifficultySettings>,
    pub questions: BTreeMap<Difficulty, Vec<QuestionRecord>>,
    #[serde(default)]
    pub video: VideoContent,
}

impl CourseDraft {
    pub fn is_selected(&self, difficulty: Difficulty) -> bool {
        self.difficulties.contains(&difficulty)
    }

    /// Selects the tier with empty settings, or drops it together with its
    /// settings and questions. Returns whether the tier is selected afterwards.
    pub fn toggle_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.is_selected(difficulty) {
            self.difficulties.retain(|d| *d != difficulty);
            self.settings.remove(&difficulty);
            self.questions.remove(&difficulty);
            false
        } else {
            self.select_difficulty(difficulty);
            true
        }
    }

    pub fn select_difficulty(&mut self, difficulty: Difficulty) {
        if !self.is_selected(difficulty) {
            self.difficulties.push(difficulty);
            self.settings.insert(difficulty, DifficultySettings::default());
            self.questions.insert(difficulty, Vec::new());
        }
    }

    pub fn settings_for(&self, difficulty: Difficulty) -> Option<&DifficultySettings> {
        self.settings.get(&difficulty)
    }

    pub fn questions_for(&self, difficulty: Difficulty) -> &[QuestionRecord] {
        self.questions
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn add_question(&mut self, question: QuestionRecord) -> bool {
        match self.questions.get_mut(&question.difficulty) {
            Some(list) if self.difficulties.contains(&question.difficulty) => {
                list.push(question);
                true
            }
            _ => false,
        }
    }

    pub fn remove_question(&mut self, difficulty: Difficulty, id: Uuid) -> Option<QuestionRecord> {
        let list = self.questions.get_mut(&difficulty)?;
        let idx = list.iter().position(|q| q.id == id)?;
        Some(list.remove(idx))
    }

    pub fn clear_questions(&mut self, difficulty: Difficulty) -> usize {
        self.questions
            .get_mut(&difficulty)
            .map(|list| std::mem::take(list).len())
            .unwrap_or(0)
    }

    /// Sum of `marks_per_question * max_questions` over the selected tiers
    /// whose factors are both set.
    pub fn configured_marks(&self) -> u32 {
        self.difficulties
            .iter()
            .filter_map(|d| self.settings_for(*d).and_then(DifficultySettings::total_marks))
            .fold(0u32, u32::saturating_add)
    }

    pub fn question_count(&self) -> usize {
        self.difficulties
            .iter()
            .map(|d| self.questions_for(*d).len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_off_discards_settings() {
        let mut draft = CourseDraft::default();
        assert!(draft.toggle_difficulty(Difficulty::Easy));
        draft.settings.insert(
            Difficulty::Easy,
            DifficultySettings {
                marks_per_question: Some(2),
                max_questions: Some(5),
                min_time_seconds: Some(10),
                max_time_seconds: Some(60),
            },
        );

        assert!(!draft.toggle_difficulty(Difficulty::Easy));
        assert!(draft.settings_for(Difficulty::Easy).is_none());

        assert!(draft.toggle_difficulty(Difficulty::Easy));
        assert_eq!(
            draft.settings_for(Difficulty::Easy),
            Some(&DifficultySettings::default())
        );
    }

    #[test]
    fn selection_keeps_toggle_order() {
        let mut draft = CourseDraft::default();
        draft.toggle_difficulty(Difficulty::Hard);
        draft.toggle_difficulty(Difficulty::Easy);
        assert_eq!(draft.difficulties, vec![Difficulty::Hard, Difficulty::Easy]);
    }

    #[test]
    fn configured_marks_skips_incomplete_tiers() {
        let mut draft = CourseDraft::default();
        draft.select_difficulty(Difficulty::Easy);
        draft.select_difficulty(Difficulty::Hard);
        if let Some(s) = draft.settings.get_mut(&Difficulty::Easy) {
            s.marks_per_question = Some(3);
            s.max_questions = Some(4);
        }
        if let Some(s) = draft.settings.get_mut(&Difficulty::Hard) {
            s.marks_per_question = Some(5);
        }
        assert_eq!(draft.configured_marks(), 12);
    }
}
