use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Half-open byte range into a passage's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when the range is well-formed and lies within `content_len` bytes.
    pub fn fits(&self, content_len: usize) -> bool {
        self.start <= self.end && self.end <= content_len
    }
}

/// A structural annotation over a text range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    /// Element name from the constraint grammar (e.g. "said", "persName").
    pub tag_type: String,
    pub range: TextRange,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// A unit of literary text plus the tags annotating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Passage {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    pub fn tag(&self, tag_id: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == tag_id)
    }
}
