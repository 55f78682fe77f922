//! Chapter drafts - owned subtree values that live outside any arena
//!
//! Parsers produce drafts on background threads; the writer thread turns
//! them into live chapters with [`Book::instantiate`](crate::Book::instantiate).

use crate::{AttributeValue, Attributes, Content, TITLE};
use serde::{Deserialize, Serialize};

/// An immutable description of a chapter subtree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChapterDraft {
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub content: Content,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChapterDraft>,
}

impl ChapterDraft {
    /// Create a leaf draft with a title
    pub fn titled(title: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(TITLE.to_string(), AttributeValue::Text(title.into()));
        Self {
            attributes,
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    pub fn with_child(mut self, child: ChapterDraft) -> Self {
        self.children.push(child);
        self
    }

    pub fn title(&self) -> &str {
        self.attributes
            .get(TITLE)
            .and_then(AttributeValue::as_text)
            .unwrap_or("")
    }

    /// Number of chapters in this subtree, including itself
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ChapterDraft::count).sum::<usize>()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
