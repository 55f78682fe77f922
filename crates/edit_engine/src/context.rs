//! Document context - the explicit handle every mutation goes through
//!
//! A context owns one book together with the state that must stay in step
//! with its tree: modification status, the current selection, the clipboard,
//! the set of chapters with an open editor, and the event sinks.

use crate::{Clipboard, EventSink, EventSinks, Result, TreeEvent};
use doc_model::{Book, ChapterDraft, ChapterId, DocModelError, DocumentId, Selection};
use std::collections::HashSet;

/// Editing state of a single open document
#[derive(Debug)]
pub struct DocumentContext {
    id: DocumentId,
    book: Book,
    /// Set by tracked mutations, cleared when the document is saved
    modified: bool,
    /// Bumped by every mutation, tracked or not
    revision: u64,
    selection: Selection,
    clipboard: Clipboard,
    editors: HashSet<ChapterId>,
    sinks: EventSinks,
}

impl DocumentContext {
    /// Create a context around an existing book
    pub fn new(book: Book) -> Self {
        Self {
            id: DocumentId::new(),
            book,
            modified: false,
            revision: 0,
            selection: Selection::empty(),
            clipboard: Clipboard::Empty,
            editors: HashSet::new(),
            sinks: EventSinks::default(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub(crate) fn book_mut(&mut self) -> &mut Book {
        &mut self.book
    }

    /// Whether the document changed since it was last saved
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag after the document has been written out
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn touch(&mut self, track_modified: bool) {
        self.revision += 1;
        if track_modified {
            self.modified = true;
        }
    }

    /// Register a sink for tree-change notifications
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.subscribe(sink);
    }

    pub(crate) fn emit(&mut self, event: TreeEvent) {
        self.sinks.emit(event);
    }

    /// Allocate a detached chapter with a title
    pub fn new_chapter(&mut self, title: impl Into<String>) -> ChapterId {
        self.book.tree_mut().create_titled(title)
    }

    /// Materialise a draft as a detached subtree
    pub fn instantiate(&mut self, draft: &ChapterDraft) -> ChapterId {
        self.book.instantiate(draft)
    }

    /// Duplicate a leaf chapter into a new detached chapter
    pub fn copy_chapter(&mut self, id: ChapterId) -> Result<ChapterId> {
        Ok(self.book.tree_mut().copy(id)?)
    }

    pub(crate) fn require(&self, id: ChapterId) -> Result<()> {
        if self.book.tree().contains(id) {
            Ok(())
        } else {
            Err(DocModelError::ChapterNotFound(id).into())
        }
    }

    pub(crate) fn require_attached(&self, id: ChapterId) -> Result<()> {
        self.require(id)?;
        if self.book.is_attached(id) {
            Ok(())
        } else {
            Err(crate::EditError::NotAttached(id))
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected chapters that are still attached, in selection order
    pub fn selected_chapters(&self) -> Vec<ChapterId> {
        self.selection
            .resolve(self.book.tree(), self.book.root())
            .into_iter()
            .filter(|&id| self.book.is_attached(id))
            .collect()
    }

    /// Focus the given chapters; detached or unknown handles are ignored
    pub fn select(&mut self, chapters: &[ChapterId]) {
        let attached: Vec<ChapterId> = chapters
            .iter()
            .copied()
            .filter(|&id| self.book.is_attached(id))
            .collect();
        self.selection = Selection::capture(self.book.tree(), &attached);
    }

    /// Restore a previously captured selection.
    ///
    /// Paths that no longer match the tree are dropped. Returns whether
    /// anything could be restored.
    pub fn restore_selection(&mut self, selection: &Selection) -> bool {
        let chapters: Vec<ChapterId> = selection
            .resolve(self.book.tree(), self.book.root())
            .into_iter()
            .filter(|&id| self.book.is_attached(id))
            .collect();
        self.selection = Selection::capture(self.book.tree(), &chapters);
        !self.selection.is_empty()
    }

    pub(crate) fn prune_selection(&mut self) {
        self.selection.retain_resolvable(self.book.tree(), self.book.root());
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub(crate) fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    /// Hold chapters on the clipboard for a later move
    pub fn cut_to_clipboard(&mut self, chapters: &[ChapterId]) -> Result<()> {
        self.clipboard.cut(&self.book, chapters)
    }

    /// Hold leaf chapters on the clipboard for a later duplicate-paste
    pub fn copy_to_clipboard(&mut self, chapters: &[ChapterId]) -> Result<()> {
        self.clipboard.copy(&self.book, chapters)
    }

    /// Record that an editor is showing `id`
    pub fn open_editor(&mut self, id: ChapterId) -> Result<()> {
        self.require_attached(id)?;
        self.editors.insert(id);
        Ok(())
    }

    pub fn close_editor(&mut self, id: ChapterId) -> bool {
        self.editors.remove(&id)
    }

    pub fn is_editor_open(&self, id: ChapterId) -> bool {
        self.editors.contains(&id)
    }

    /// Close editors and drop cut clipboard entries for a subtree leaving the tree
    pub(crate) fn release_references(&mut self, removed: ChapterId) {
        for id in self.book.tree().descendants(removed) {
            if self.editors.remove(&id) {
                self.emit(TreeEvent::EditorClosed(id));
            }
            if self.clipboard.item_deleted(id) {
                self.emit(TreeEvent::ClipboardEntryDropped(id));
            }
        }
    }

    /// Free detached chapters that nothing refers to any more.
    ///
    /// `retained` holds the chapters referenced by the undo history; the
    /// clipboard's chapters are added here.
    pub(crate) fn release_unreferenced(&mut self, mut retained: HashSet<ChapterId>) -> usize {
        retained.extend(self.clipboard.chapters().iter().copied());
        let root = self.book.root();
        let released = self.book.tree_mut().sweep(root, &retained);
        if released > 0 {
            tracing::debug!(document = %self.id, released, "released detached chapters");
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::text_chapter;

    fn create_test_context() -> (DocumentContext, ChapterId, ChapterId) {
        let draft = ChapterDraft::titled("Book")
            .with_child(text_chapter("A", "a"))
            .with_child(ChapterDraft::titled("B").with_child(text_chapter("C", "c")));
        let ctx = DocumentContext::new(Book::from_draft(&draft));
        let a = ctx.book().find_by_title("A").unwrap();
        let c = ctx.book().find_by_title("C").unwrap();
        (ctx, a, c)
    }

    #[test]
    fn test_select_ignores_detached_chapters() {
        let (mut ctx, a, c) = create_test_context();
        let loose = ctx.new_chapter("loose");
        ctx.select(&[c, loose, a]);
        assert_eq!(ctx.selected_chapters(), vec![c, a]);
    }

    #[test]
    fn test_restore_selection_drops_missing_paths() {
        let (mut ctx, a, c) = create_test_context();
        ctx.select(&[a, c]);
        let captured = ctx.selection().clone();

        let b = ctx.book().tree().parent_of(c).unwrap();
        ctx.book_mut().tree_mut().remove_at(b, 0).unwrap();

        assert!(ctx.restore_selection(&captured));
        assert_eq!(ctx.selected_chapters(), vec![a]);
    }

    #[test]
    fn test_open_editor_requires_attached_chapter() {
        let (mut ctx, a, _c) = create_test_context();
        ctx.open_editor(a).unwrap();
        assert!(ctx.is_editor_open(a));

        let loose = ctx.new_chapter("loose");
        assert!(matches!(ctx.open_editor(loose), Err(crate::EditError::NotAttached(_))));
        assert!(ctx.close_editor(a));
        assert!(!ctx.close_editor(a));
    }

    #[test]
    fn test_modified_tracking() {
        let (mut ctx, ..) = create_test_context();
        assert!(!ctx.is_modified());
        ctx.touch(false);
        assert!(!ctx.is_modified());
        assert_eq!(ctx.revision(), 1);
        ctx.touch(true);
        assert!(ctx.is_modified());
        ctx.mark_saved();
        assert!(!ctx.is_modified());
        assert_eq!(ctx.revision(), 2);
    }
}
