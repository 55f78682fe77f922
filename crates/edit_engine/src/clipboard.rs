//! Clipboard - chapters held for a later paste
//!
//! A cut does not touch the tree; the held chapters are only detached when
//! they are pasted, so abandoning a cut costs nothing.

use crate::{Command, DocumentContext, EditError, Result, Step, UndoItem};
use doc_model::{Book, ChapterId, DocModelError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipboardMode {
    Copy,
    Cut,
}

/// Clipboard state; `Empty` means there is nothing to paste
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Clipboard {
    #[default]
    Empty,
    Holding {
        chapters: Vec<ChapterId>,
        mode: ClipboardMode,
    },
}

/// What a paste request ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    /// The chapters now under the target, in insertion order
    Pasted(Vec<ChapterId>),
    /// The caller declined the confirmation
    Declined,
    NothingToPaste,
}

impl Clipboard {
    /// Hold `chapters` for a copy-paste. Sections are refused.
    pub fn copy(&mut self, book: &Book, chapters: &[ChapterId]) -> Result<()> {
        let mut held = Vec::with_capacity(chapters.len());
        for &id in chapters {
            let chapter = book
                .chapter(id)
                .ok_or(DocModelError::ChapterNotFound(id))?;
            if chapter.is_section() {
                return Err(DocModelError::SectionNotCopyable(id).into());
            }
            if !held.contains(&id) {
                held.push(id);
            }
        }
        *self = Self::holding(held, ClipboardMode::Copy);
        Ok(())
    }

    /// Hold `chapters` for a move. The tree is left untouched.
    ///
    /// Chapters inside another held chapter are folded into it.
    pub fn cut(&mut self, book: &Book, chapters: &[ChapterId]) -> Result<()> {
        // Validates attachment and rejects the root
        UndoItem::locate(book, chapters)?;
        let tree = book.tree();
        let mut held: Vec<ChapterId> = Vec::with_capacity(chapters.len());
        for &id in chapters {
            let nested = chapters
                .iter()
                .any(|&other| other != id && tree.is_ancestor(other, id));
            if !nested && !held.contains(&id) {
                held.push(id);
            }
        }
        *self = Self::holding(held, ClipboardMode::Cut);
        Ok(())
    }

    fn holding(chapters: Vec<ChapterId>, mode: ClipboardMode) -> Self {
        if chapters.is_empty() {
            Clipboard::Empty
        } else {
            Clipboard::Holding { chapters, mode }
        }
    }

    /// A held chapter was deleted from the tree by someone else.
    ///
    /// In cut mode the chapter is dropped from the held set and `true` is
    /// returned. Copy mode keeps it.
    pub fn item_deleted(&mut self, id: ChapterId) -> bool {
        let Clipboard::Holding {
            chapters,
            mode: ClipboardMode::Cut,
        } = self
        else {
            return false;
        };
        let before = chapters.len();
        chapters.retain(|&c| c != id);
        let dropped = chapters.len() != before;
        if chapters.is_empty() {
            *self = Clipboard::Empty;
        }
        dropped
    }

    pub fn can_paste(&self) -> bool {
        matches!(self, Clipboard::Holding { .. })
    }

    pub fn mode(&self) -> Option<ClipboardMode> {
        match self {
            Clipboard::Holding { mode, .. } => Some(*mode),
            Clipboard::Empty => None,
        }
    }

    pub fn chapters(&self) -> &[ChapterId] {
        match self {
            Clipboard::Holding { chapters, .. } => chapters,
            Clipboard::Empty => &[],
        }
    }

    pub fn holds(&self, id: ChapterId) -> bool {
        self.chapters().contains(&id)
    }

    pub fn clear(&mut self) {
        *self = Clipboard::Empty;
    }

    /// Take the current state, leaving the clipboard empty
    pub fn take(&mut self) -> Clipboard {
        std::mem::take(self)
    }
}

impl DocumentContext {
    /// Paste the clipboard at the end of `target`'s children.
    ///
    /// Returns the command that undoes the paste, or `None` when the
    /// clipboard is empty. Copy mode inserts duplicates and keeps the
    /// clipboard; cut mode moves the held chapters and empties it. On error
    /// the tree and the clipboard are left as they were.
    pub(crate) fn paste_clipboard(&mut self, target: ChapterId) -> Result<Option<Command>> {
        self.require_attached(target)?;
        let selection = self.selection().clone();

        match self.clipboard().clone() {
            Clipboard::Empty => Ok(None),
            Clipboard::Holding {
                chapters,
                mode: ClipboardMode::Copy,
            } => {
                let mut duplicates = Vec::with_capacity(chapters.len());
                for &id in &chapters {
                    duplicates.push(self.copy_chapter(id)?);
                }
                let step = self.append_chapters(&duplicates, target)?;
                self.select(&duplicates);
                Ok(Some(Command::new("Paste", selection).with_step(step)))
            }
            Clipboard::Holding {
                chapters,
                mode: ClipboardMode::Cut,
            } => {
                let tree = self.book().tree();
                if let Some(&inner) = chapters.iter().find(|&&id| tree.is_ancestor(id, target)) {
                    return Err(EditError::PasteIntoSelf(inner));
                }
                let groups = UndoItem::locate(self.book(), &chapters)?;

                // Own removals must not shrink the held set
                let held = self.clipboard_mut().take();
                let mut command = Command::new("Paste", selection);
                match self.move_chapters(groups, &chapters, target, &mut command) {
                    Ok(()) => {
                        self.select(&chapters);
                        Ok(Some(command))
                    }
                    Err(err) => {
                        command.abandon(self);
                        *self.clipboard_mut() = held;
                        Err(err)
                    }
                }
            }
        }
    }

    fn move_chapters(
        &mut self,
        groups: Vec<UndoItem>,
        chapters: &[ChapterId],
        target: ChapterId,
        command: &mut Command,
    ) -> Result<()> {
        for group in groups {
            self.remove_chapters_from(&group.chapters, group.parent, &group.indices, true)?;
            command.push(Step::Removed(group));
        }
        let step = self.append_chapters(chapters, target)?;
        command.push(step);
        Ok(())
    }

    fn append_chapters(&mut self, chapters: &[ChapterId], target: ChapterId) -> Result<Step> {
        let start = self.book().tree().children_of(target).len();
        let indices: Vec<usize> = (start..start + chapters.len()).collect();
        self.insert_chapters_into(chapters, target, &indices, true)?;
        Ok(Step::Inserted(UndoItem::new(target, chapters.to_vec(), indices)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{text_chapter, ChapterDraft};

    fn create_test_book() -> Book {
        Book::from_draft(
            &ChapterDraft::titled("Book")
                .with_child(text_chapter("A", "a"))
                .with_child(
                    ChapterDraft::titled("B")
                        .with_child(text_chapter("C", "c"))
                        .with_child(text_chapter("D", "d")),
                ),
        )
    }

    #[test]
    fn test_copy_rejects_sections() {
        let book = create_test_book();
        let b = book.find_by_title("B").unwrap();
        let c = book.find_by_title("C").unwrap();
        let mut clipboard = Clipboard::default();

        let err = clipboard.copy(&book, &[c, b]).unwrap_err();
        assert!(matches!(err, EditError::DocModel(DocModelError::SectionNotCopyable(id)) if id == b));
        assert!(!clipboard.can_paste());

        clipboard.copy(&book, &[c]).unwrap();
        assert_eq!(clipboard.mode(), Some(ClipboardMode::Copy));
        assert!(clipboard.holds(c));
    }

    #[test]
    fn test_cut_folds_nested_chapters() {
        let book = create_test_book();
        let b = book.find_by_title("B").unwrap();
        let c = book.find_by_title("C").unwrap();
        let mut clipboard = Clipboard::default();

        clipboard.cut(&book, &[c, b]).unwrap();
        assert_eq!(clipboard.chapters(), &[b]);
        assert_eq!(clipboard.mode(), Some(ClipboardMode::Cut));
        assert!(clipboard.cut(&book, &[book.root()]).is_err());
    }

    #[test]
    fn test_item_deleted_only_in_cut_mode() {
        let book = create_test_book();
        let a = book.find_by_title("A").unwrap();
        let c = book.find_by_title("C").unwrap();
        let mut clipboard = Clipboard::default();

        clipboard.copy(&book, &[a, c]).unwrap();
        assert!(!clipboard.item_deleted(a));
        assert_eq!(clipboard.chapters().len(), 2);

        clipboard.cut(&book, &[a, c]).unwrap();
        assert!(clipboard.item_deleted(a));
        assert!(!clipboard.item_deleted(a));
        assert!(clipboard.can_paste());
        assert!(clipboard.item_deleted(c));
        assert_eq!(clipboard, Clipboard::Empty);
    }

    #[test]
    fn test_paste_cut_into_own_subtree_is_refused() {
        let mut ctx = DocumentContext::new(create_test_book());
        let b = ctx.book().find_by_title("B").unwrap();
        let c = ctx.book().find_by_title("C").unwrap();
        ctx.cut_to_clipboard(&[b]).unwrap();

        let err = ctx.paste_clipboard(c).unwrap_err();
        assert!(matches!(err, EditError::PasteIntoSelf(id) if id == b));
        assert_eq!(ctx.book().outline(), "Book[A, B[C, D]]");
        assert!(ctx.clipboard().holds(b));
    }

    #[test]
    fn test_paste_copy_is_repeatable() {
        let mut ctx = DocumentContext::new(create_test_book());
        let root = ctx.book().root();
        let a = ctx.book().find_by_title("A").unwrap();
        ctx.copy_to_clipboard(&[a]).unwrap();

        ctx.paste_clipboard(root).unwrap().unwrap();
        ctx.paste_clipboard(root).unwrap().unwrap();
        assert_eq!(ctx.book().outline(), "Book[A, B[C, D], A, A]");
        assert!(ctx.clipboard().can_paste());
    }

    #[test]
    fn test_paste_empty_clipboard() {
        let mut ctx = DocumentContext::new(create_test_book());
        let root = ctx.book().root();
        assert!(ctx.paste_clipboard(root).unwrap().is_none());
    }
}
