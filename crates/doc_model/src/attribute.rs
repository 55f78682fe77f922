//! Chapter attributes and content handles
//!
//! Attributes are a string-keyed map of typed values. The primary text of a
//! chapter is kept apart from the attribute map in a [`Content`] handle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Attribute key holding the chapter title
pub const TITLE: &str = "title";
/// Attribute key holding the cover image
pub const COVER: &str = "cover";
/// Attribute key holding the short introduction
pub const INTRO: &str = "intro";
/// Attribute key holding the author name
pub const AUTHOR: &str = "author";
/// Attribute key holding the publication date
pub const DATE: &str = "date";
/// Attribute key holding the content language
pub const LANGUAGE: &str = "language";

/// Reference to binary data stored outside the tree (cover images, attachments)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Location of the data
    pub path: PathBuf,
    /// MIME type, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Rich text with a declared markup type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRef {
    pub text: String,
    /// Markup type, e.g. `"plain"` or `"html"`
    pub markup: String,
}

impl TextRef {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: "plain".to_string(),
        }
    }
}

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Date(NaiveDate),
    /// BCP 47 language tag
    Locale(String),
    File(FileRef),
    RichText(TextRef),
}

impl AttributeValue {
    /// Get the string payload of a `Text` value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Real(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Boolean(v)
    }
}

impl From<NaiveDate> for AttributeValue {
    fn from(v: NaiveDate) -> Self {
        AttributeValue::Date(v)
    }
}

/// Attribute map of a chapter, ordered by key
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Prior values of the attributes touched by an update.
///
/// `None` records a key that was absent before the update, so restoring the
/// snapshot removes it again.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    /// Whether the update replaced the whole map
    pub replace_all: bool,
    pub values: BTreeMap<String, Option<AttributeValue>>,
}

impl AttributeSnapshot {
    /// Snapshot the complete attribute map
    pub fn whole(attributes: &Attributes) -> Self {
        Self {
            replace_all: true,
            values: attributes
                .iter()
                .map(|(k, v)| (k.clone(), Some(v.clone())))
                .collect(),
        }
    }

    /// Snapshot only `keys` from `attributes`
    pub fn of_keys<'a>(attributes: &Attributes, keys: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            replace_all: false,
            values: keys
                .into_iter()
                .map(|k| (k.clone(), attributes.get(k).cloned()))
                .collect(),
        }
    }

    /// Present values only, as an attribute map
    pub fn present(&self) -> Attributes {
        self.values
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

/// Primary content of a chapter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Content {
    #[default]
    Empty,
    Text(String),
    /// Content backed by an external file
    File(FileRef),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(text.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Content::Empty => true,
            Content::Text(s) => s.is_empty(),
            Content::File(_) => false,
        }
    }

    /// Inline text, if the content is held in memory
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Empty => Some(""),
            Content::Text(s) => Some(s),
            Content::File(_) => None,
        }
    }
}
