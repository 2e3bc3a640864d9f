use serde::{Deserialize, Serialize};

/// The six steps of the course creation wizard, in navigation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    BasicInfo,
    DifficultySelection,
    MarksAndDuration,
    Questions,
    VideoContent,
    PreviewAndSave,
}

pub const MIN_STEP: u8 = 1;
pub const MAX_STEP: u8 = 6;

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::BasicInfo,
        WizardStep::DifficultySelection,
        WizardStep::MarksAndDuration,
        WizardStep::Questions,
        WizardStep::VideoContent,
        WizardStep::PreviewAndSave,
    ];

    pub fn from_number(n: u8) -> Option<Self> {
        if (MIN_STEP..=MAX_STEP).contains(&n) {
            Some(Self::ALL[(n - 1) as usize])
        } else {
            None
        }
    }

    pub fn to_number(self) -> u8 {
        match self {
            Self::BasicInfo => 1,
            Self::DifficultySelection => 2,
            Self::MarksAndDuration => 3,
            Self::Questions => 4,
            Self::VideoContent => 5,
            Self::PreviewAndSave => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Info",
            Self::DifficultySelection => "Difficulty Selection",
            Self::MarksAndDuration => "Marks & Duration",
            Self::Questions => "Questions",
            Self::VideoContent => "Video Content",
            Self::PreviewAndSave => "Preview & Save",
        }
    }

    /// Steps whose data is checked by the validator (everything before the preview).
    pub fn validated() -> impl Iterator<Item = WizardStep> {
        Self::ALL.into_iter().filter(|s| *s != Self::PreviewAndSave)
    }
}
