//! Book - the document root and its auxiliary metadata

use crate::{Chapter, ChapterDraft, ChapterId, ChapterTree, Content};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Auxiliary key-value data stored with a book but outside its content
pub type Extensions = BTreeMap<String, String>;

/// A chapter tree rooted at a parentless chapter, plus book-level extensions.
///
/// Root-ness is positional: the root is an ordinary [`Chapter`] that happens
/// to have no parent.
#[derive(Debug, Clone)]
pub struct Book {
    tree: ChapterTree,
    root: ChapterId,
    extensions: Extensions,
}

impl Book {
    /// Create a book with an empty root chapter
    pub fn new(title: impl Into<String>) -> Self {
        let mut tree = ChapterTree::new();
        let root = tree.create_titled(title);
        Self {
            tree,
            root,
            extensions: Extensions::new(),
        }
    }

    /// Build a book whose root is materialised from `draft`
    pub fn from_draft(draft: &ChapterDraft) -> Self {
        let mut tree = ChapterTree::new();
        let root = instantiate_into(&mut tree, draft);
        Self {
            tree,
            root,
            extensions: Extensions::new(),
        }
    }

    pub fn root(&self) -> ChapterId {
        self.root
    }

    pub fn tree(&self) -> &ChapterTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ChapterTree {
        &mut self.tree
    }

    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.tree.get(id)
    }

    /// Title of a chapter, or an empty string
    pub fn title(&self, id: ChapterId) -> &str {
        self.tree.get(id).map(Chapter::title).unwrap_or("")
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Whether the chapter is reachable from the root
    pub fn is_attached(&self, id: ChapterId) -> bool {
        self.tree.is_ancestor(self.root, id)
    }

    /// All attached chapters in pre-order, starting with the root
    pub fn document_order(&self) -> Vec<ChapterId> {
        self.tree.descendants(self.root)
    }

    /// Find the first attached chapter with the given title
    pub fn find_by_title(&self, title: &str) -> Option<ChapterId> {
        self.document_order()
            .into_iter()
            .find(|&id| self.title(id) == title)
    }

    /// Materialise a draft as a new detached subtree
    pub fn instantiate(&mut self, draft: &ChapterDraft) -> ChapterId {
        instantiate_into(&mut self.tree, draft)
    }

    /// Snapshot a chapter and its descendants
    pub fn to_draft(&self, id: ChapterId) -> Option<ChapterDraft> {
        let chapter = self.tree.get(id)?;
        let children = chapter
            .children()
            .iter()
            .filter_map(|&child| self.to_draft(child))
            .collect();
        Some(ChapterDraft {
            attributes: chapter.attributes().clone(),
            content: chapter.content().clone(),
            children,
        })
    }

    /// Compact title outline, e.g. `Book[A, B[C, D]]`
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.root, &mut out);
        out
    }

    fn write_outline(&self, id: ChapterId, out: &mut String) {
        out.push_str(self.title(id));
        let children = self.tree.children_of(id);
        if children.is_empty() {
            return;
        }
        out.push('[');
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_outline(child, out);
        }
        out.push(']');
    }
}

fn instantiate_into(tree: &mut ChapterTree, draft: &ChapterDraft) -> ChapterId {
    let id = tree.create(draft.attributes.clone(), draft.content.clone());
    for child in &draft.children {
        let child_id = instantiate_into(tree, child);
        // A fresh detached chapter always appends cleanly
        let _ = tree.append(id, child_id);
    }
    id
}

/// Book-level metadata as persisted next to the tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookDraft {
    pub root: ChapterDraft,
    #[serde(default)]
    pub extensions: Extensions,
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            root: book.to_draft(book.root()).unwrap_or_default(),
            extensions: book.extensions().clone(),
        }
    }
}

impl From<&BookDraft> for Book {
    fn from(draft: &BookDraft) -> Self {
        let mut book = Book::from_draft(&draft.root);
        book.extensions = draft.extensions.clone();
        book
    }
}

impl Default for Book {
    fn default() -> Self {
        Self::new("")
    }
}

/// Convenience for tests and importers: a leaf draft with text content
pub fn text_chapter(title: &str, text: &str) -> ChapterDraft {
    ChapterDraft::titled(title).with_content(Content::text(text))
}
