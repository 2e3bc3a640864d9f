/// Lowercases `key` and drops everything outside `[a-z]`, so "Course Name",
/// "course_name" and "COURSENAME" all become `coursename`.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicField {
    Title,
    Description,
    MaxMarks,
    Category,
    Difficulties,
    IsPaid,
    Price,
}

static BASIC_ALIASES: &[(BasicField, &[&str])] = &[
    (BasicField::Title, &["title", "name", "coursename", "coursetitle"]),
    (
        BasicField::Description,
        &["description", "desc", "coursedescription"],
    ),
    (
        BasicField::MaxMarks,
        &["maxmarks", "totalmarks", "marks", "coursemaxmarks"],
    ),
    (
        BasicField::Category,
        &["category", "categoryid", "coursecategory"],
    ),
    (
        BasicField::Difficulties,
        &["difficulty", "difficulties", "difficultylevels", "levels"],
    ),
    (BasicField::IsPaid, &["ispaid", "paid", "coursetype"]),
    (BasicField::Price, &["price", "courseprice", "amount"]),
];

/// Exact alias lookup on the canonical key.
pub fn match_basic_field(raw_key: &str) -> Option<BasicField> {
    let key = normalize_key(raw_key);
    BASIC_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&key.as_str()))
        .map(|(field, _)| *field)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    MarksPerQuestion,
    MaxQuestions,
    MinTime,
    MaxTime,
}

type KeyPredicate = fn(&str) -> bool;

// Evaluated in order, first match wins. "marks per question" must be tested
// before "max questions" since both mention questions.
static SETTING_MATCHERS: &[(SettingField, KeyPredicate)] = &[
    (SettingField::MarksPerQuestion, |k| {
        k.contains("marks") && (k.contains("question") || k.contains("per"))
    }),
    (SettingField::MaxQuestions, |k| {
        k.contains("question")
            && !k.contains("marks")
            && ["max", "count", "number", "total"].iter().any(|w| k.contains(w))
    }),
    (SettingField::MinTime, |k| k.contains("min") && k.contains("time")),
    (SettingField::MaxTime, |k| k.contains("max") && k.contains("time")),
];

/// Substring-based synonym lookup for difficulty settings.
pub fn match_setting_field(raw_key: &str) -> Option<SettingField> {
    let key = normalize_key(raw_key);
    SETTING_MATCHERS
        .iter()
        .find(|(_, matches)| matches(&key))
        .map(|(field, _)| *field)
}
