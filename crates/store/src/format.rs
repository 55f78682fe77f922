//! Book formats - parsers and makers keyed by file extension
//!
//! Parsers and makers only ever see [`ChapterDraft`] values, never the live
//! tree, so they can run on blocking worker threads.

use crate::{Result, StoreError};
use anyhow::Context;
use doc_model::{ChapterDraft, Content};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Reads a source file into a chapter subtree
pub trait BookParser: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercase file extensions handled, without the dot
    fn extensions(&self) -> &[&str];

    fn parse(&self, path: &Path) -> anyhow::Result<ChapterDraft>;
}

/// Writes a chapter subtree to a destination file
pub trait BookMaker: Send + Sync {
    fn name(&self) -> &str;

    fn extensions(&self) -> &[&str];

    fn make(&self, draft: &ChapterDraft, path: &Path) -> anyhow::Result<()>;
}

/// Chapter drafts stored as pretty JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl BookParser for JsonFormat {
    fn name(&self) -> &str {
        "JSON"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn parse(&self, path: &Path) -> anyhow::Result<ChapterDraft> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        ChapterDraft::from_json(&json).with_context(|| format!("parsing {}", path.display()))
    }
}

impl BookMaker for JsonFormat {
    fn name(&self) -> &str {
        "JSON"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn make(&self, draft: &ChapterDraft, path: &Path) -> anyhow::Result<()> {
        let json = draft.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }
}

/// Plain text: one file is one chapter titled after the file stem.
///
/// Export writes every chapter depth-first as its title on a line of its
/// own, followed by its text and a blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormat;

impl TextFormat {
    fn write_chapter(draft: &ChapterDraft, out: &mut String) {
        if !draft.title().is_empty() {
            let _ = writeln!(out, "{}", draft.title());
        }
        if let Content::Text(text) = &draft.content {
            let _ = writeln!(out, "{}", text);
        }
        out.push('\n');
        for child in &draft.children {
            Self::write_chapter(child, out);
        }
    }
}

impl BookParser for TextFormat {
    fn name(&self) -> &str {
        "Plain text"
    }

    fn extensions(&self) -> &[&str] {
        &["txt"]
    }

    fn parse(&self, path: &Path) -> anyhow::Result<ChapterDraft> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ChapterDraft::titled(title).with_content(Content::Text(text)))
    }
}

impl BookMaker for TextFormat {
    fn name(&self) -> &str {
        "Plain text"
    }

    fn extensions(&self) -> &[&str] {
        &["txt"]
    }

    fn make(&self, draft: &ChapterDraft, path: &Path) -> anyhow::Result<()> {
        let mut out = String::new();
        Self::write_chapter(draft, &mut out);
        std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
    }
}

/// Parsers and makers looked up by file extension
#[derive(Clone)]
pub struct FormatRegistry {
    parsers: Vec<Arc<dyn BookParser>>,
    makers: Vec<Arc<dyn BookMaker>>,
}

impl FormatRegistry {
    /// A registry with no formats
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
            makers: Vec::new(),
        }
    }

    /// A registry with the built-in JSON and text formats
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_parser(Arc::new(JsonFormat));
        registry.register_parser(Arc::new(TextFormat));
        registry.register_maker(Arc::new(JsonFormat));
        registry.register_maker(Arc::new(TextFormat));
        registry
    }

    /// Register a parser; later registrations win for shared extensions
    pub fn register_parser(&mut self, parser: Arc<dyn BookParser>) {
        self.parsers.insert(0, parser);
    }

    pub fn register_maker(&mut self, maker: Arc<dyn BookMaker>) {
        self.makers.insert(0, maker);
    }

    pub fn parser_for(&self, path: &Path) -> Result<Arc<dyn BookParser>> {
        let ext = extension_of(path)?;
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&ext.as_str()))
            .cloned()
            .ok_or_else(|| StoreError::UnsupportedFormat(path.display().to_string()))
    }

    pub fn maker_for(&self, path: &Path) -> Result<Arc<dyn BookMaker>> {
        let ext = extension_of(path)?;
        self.makers
            .iter()
            .find(|m| m.extensions().contains(&ext.as_str()))
            .cloned()
            .ok_or_else(|| StoreError::UnsupportedFormat(path.display().to_string()))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("parsers", &self.parsers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("makers", &self.makers.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}

fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .ok_or_else(|| StoreError::UnsupportedFormat(path.display().to_string()))
}
