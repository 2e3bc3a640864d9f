use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    #[default]
    None,
    Youtube,
    External,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLink {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Optional video material attached to paid courses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoContent {
    #[serde(default)]
    pub kind: VideoKind,
    #[serde(default)]
    pub links: Vec<VideoLink>,
}

impl VideoContent {
    pub fn is_enabled(&self) -> bool {
        self.kind != VideoKind::None
    }

    /// Links that carry a url; blank rows are allowed and skipped.
    pub fn filled_links(&self) -> impl Iterator<Item = (usize, &VideoLink)> {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, link)| !link.url.trim().is_empty())
    }
}
