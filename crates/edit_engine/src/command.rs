//! Undo records
//!
//! A [`Command`] is one entry on the undo or redo stack. It batches the
//! [`Step`]s of a single user-level operation so they are reversed together,
//! and carries the selection that was current when it was recorded.

use crate::{DocumentContext, EditError, Result};
use doc_model::{AttributeSnapshot, Book, ChapterId, DocModelError, Selection};
use std::collections::HashSet;

/// Chapters inserted into or removed from one parent at ascending indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoItem {
    pub chapters: Vec<ChapterId>,
    pub parent: ChapterId,
    pub indices: Vec<usize>,
}

impl UndoItem {
    pub fn new(parent: ChapterId, chapters: Vec<ChapterId>, indices: Vec<usize>) -> Self {
        debug_assert_eq!(chapters.len(), indices.len());
        Self {
            chapters,
            parent,
            indices,
        }
    }

    /// Group attached chapters by their current parent.
    ///
    /// Chapters nested inside another listed chapter are folded into it.
    /// Groups follow the order in which their parents first appear and each
    /// group is sorted by index, ready for a removal.
    pub fn locate(book: &Book, chapters: &[ChapterId]) -> Result<Vec<UndoItem>> {
        let tree = book.tree();
        let listed: HashSet<ChapterId> = chapters.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut groups: Vec<(ChapterId, Vec<(usize, ChapterId)>)> = Vec::new();

        for &id in chapters {
            if !tree.contains(id) {
                return Err(DocModelError::ChapterNotFound(id).into());
            }
            if id == book.root() {
                return Err(DocModelError::RootChapter("detached").into());
            }
            if !book.is_attached(id) {
                return Err(EditError::NotAttached(id));
            }
            let nested = tree
                .path_to(id)
                .unwrap_or_default()
                .iter()
                .any(|&ancestor| ancestor != id && listed.contains(&ancestor));
            if nested || !seen.insert(id) {
                continue;
            }

            let Some(parent) = tree.parent_of(id) else {
                return Err(EditError::NotAttached(id));
            };
            let Some(index) = tree.index_of(parent, id) else {
                return Err(EditError::NotAttached(id));
            };
            match groups.iter_mut().find(|(p, _)| *p == parent) {
                Some((_, members)) => members.push((index, id)),
                None => groups.push((parent, vec![(index, id)])),
            }
        }

        Ok(groups
            .into_iter()
            .map(|(parent, mut members)| {
                members.sort_unstable();
                let (indices, chapters) = members.into_iter().unzip();
                UndoItem::new(parent, chapters, indices)
            })
            .collect())
    }
}

/// One reversible mutation, described by what it did
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Chapters were inserted; reversing removes them again
    Inserted(UndoItem),
    /// Chapters were removed; reversing re-inserts them
    Removed(UndoItem),
    /// `previous` was swapped out for `current` at `index` of `parent`
    Replaced {
        parent: ChapterId,
        index: usize,
        previous: ChapterId,
        current: ChapterId,
    },
    /// Attribute values overwritten on a chapter
    Attributes {
        chapter: ChapterId,
        snapshot: AttributeSnapshot,
    },
}

impl Step {
    /// Apply the reverse mutation and return the step that reverses it in turn
    fn revert(&self, ctx: &mut DocumentContext) -> Result<Step> {
        match self {
            Step::Inserted(item) => {
                ctx.remove_chapters_from(&item.chapters, item.parent, &item.indices, false)?;
                Ok(Step::Removed(item.clone()))
            }
            Step::Removed(item) => {
                ctx.insert_chapters_into(&item.chapters, item.parent, &item.indices, false)?;
                Ok(Step::Inserted(item.clone()))
            }
            Step::Replaced {
                parent,
                index,
                previous,
                ..
            } => {
                let current = ctx.replace_chapter(*parent, *index, *previous, false)?;
                Ok(Step::Replaced {
                    parent: *parent,
                    index: *index,
                    previous: current,
                    current: *previous,
                })
            }
            Step::Attributes { chapter, snapshot } => {
                let newer = ctx.restore_attributes(*chapter, snapshot)?;
                Ok(Step::Attributes {
                    chapter: *chapter,
                    snapshot: newer,
                })
            }
        }
    }

    fn chapters(&self) -> Vec<ChapterId> {
        match self {
            Step::Inserted(item) | Step::Removed(item) => {
                let mut ids = item.chapters.clone();
                ids.push(item.parent);
                ids
            }
            Step::Replaced {
                parent,
                previous,
                current,
                ..
            } => vec![*parent, *previous, *current],
            Step::Attributes { chapter, .. } => vec![*chapter],
        }
    }
}

/// An undo or redo record
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    message: String,
    selection: Selection,
    steps: Vec<Step>,
}

impl Command {
    /// Start an empty command; `selection` is restored when it is reversed
    pub fn new(message: impl Into<String>, selection: Selection) -> Self {
        Self {
            message: message.into(),
            selection,
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Message shown in "Undo ..." / "Redo ..." labels
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every chapter this record may bring back into the tree
    pub fn chapters(&self) -> impl Iterator<Item = ChapterId> + '_ {
        self.steps.iter().flat_map(Step::chapters)
    }

    /// Reverse the command and return its inverse.
    ///
    /// Steps are reversed last to first without marking the document
    /// modified. The inverse captures the selection current before the
    /// reversal; the command's own selection is restored afterwards. If a step
    /// fails, the steps already reversed are re-applied before the error is
    /// returned.
    pub(crate) fn revert(&self, ctx: &mut DocumentContext) -> Result<Command> {
        let selection = ctx.selection().clone();
        let mut inverse = Vec::with_capacity(self.steps.len());

        for step in self.steps.iter().rev() {
            match step.revert(ctx) {
                Ok(reversed) => inverse.push(reversed),
                Err(err) => {
                    rollback(ctx, &inverse);
                    return Err(err);
                }
            }
        }

        ctx.restore_selection(&self.selection);
        Ok(Command {
            message: self.message.clone(),
            selection,
            steps: inverse,
        })
    }

    /// Undo a partially built command whose steps have all been applied
    pub(crate) fn abandon(&self, ctx: &mut DocumentContext) {
        rollback(ctx, &self.steps);
    }
}

fn rollback(ctx: &mut DocumentContext, applied: &[Step]) {
    for step in applied.iter().rev() {
        if let Err(err) = step.revert(ctx) {
            tracing::warn!(error = %err, "failed to roll back step");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{text_chapter, ChapterDraft};

    fn create_test_context() -> DocumentContext {
        let draft = ChapterDraft::titled("Book")
            .with_child(text_chapter("A", "a"))
            .with_child(
                ChapterDraft::titled("B")
                    .with_child(text_chapter("C", "c"))
                    .with_child(text_chapter("D", "d")),
            )
            .with_child(text_chapter("E", "e"));
        DocumentContext::new(Book::from_draft(&draft))
    }

    fn find(ctx: &DocumentContext, title: &str) -> ChapterId {
        ctx.book().find_by_title(title).unwrap()
    }

    #[test]
    fn test_locate_groups_by_parent() {
        let ctx = create_test_context();
        let root = ctx.book().root();
        let [a, b, d, e] = ["A", "B", "D", "E"].map(|t| find(&ctx, t));

        let groups = UndoItem::locate(ctx.book(), &[d, e, a]).unwrap();
        assert_eq!(
            groups,
            vec![
                UndoItem::new(b, vec![d], vec![1]),
                UndoItem::new(root, vec![a, e], vec![0, 2]),
            ]
        );
    }

    #[test]
    fn test_locate_folds_descendants() {
        let ctx = create_test_context();
        let root = ctx.book().root();
        let [b, c] = ["B", "C"].map(|t| find(&ctx, t));

        let groups = UndoItem::locate(ctx.book(), &[c, b, b]).unwrap();
        assert_eq!(groups, vec![UndoItem::new(root, vec![b], vec![1])]);
    }

    #[test]
    fn test_locate_rejects_root_and_detached() {
        let mut ctx = create_test_context();
        let root = ctx.book().root();
        assert!(matches!(
            UndoItem::locate(ctx.book(), &[root]),
            Err(EditError::DocModel(DocModelError::RootChapter(_)))
        ));

        let loose = ctx.new_chapter("loose");
        assert!(matches!(
            UndoItem::locate(ctx.book(), &[loose]),
            Err(EditError::NotAttached(id)) if id == loose
        ));
    }

    #[test]
    fn test_revert_yields_inverse() {
        let mut ctx = create_test_context();
        let root = ctx.book().root();
        let a = find(&ctx, "A");
        ctx.select(&[a]);
        let before = ctx.selection().clone();

        ctx.remove_chapters_from(&[a], root, &[0], true).unwrap();
        let command = Command::new("Delete", before.clone())
            .with_step(Step::Removed(UndoItem::new(root, vec![a], vec![0])));
        assert!(ctx.selection().is_empty());

        let inverse = command.revert(&mut ctx).unwrap();
        assert_eq!(ctx.book().outline(), "Book[A, B[C, D], E]");
        assert_eq!(ctx.selection(), &before);
        assert_eq!(inverse.message(), "Delete");
        assert!(inverse.selection().is_empty());
        assert!(matches!(inverse.steps(), [Step::Inserted(_)]));

        inverse.revert(&mut ctx).unwrap();
        assert_eq!(ctx.book().outline(), "Book[B[C, D], E]");
    }

    #[test]
    fn test_failed_revert_rolls_back() {
        let mut ctx = create_test_context();
        let root = ctx.book().root();
        let [a, e] = ["A", "E"].map(|t| find(&ctx, t));

        ctx.remove_chapters_from(&[a], root, &[0], true).unwrap();
        // The second step is stale: E is not at index 5
        let command = Command::new("Broken", Selection::empty())
            .with_step(Step::Inserted(UndoItem::new(root, vec![e], vec![5])))
            .with_step(Step::Removed(UndoItem::new(root, vec![a], vec![0])));

        assert!(command.revert(&mut ctx).is_err());
        assert_eq!(ctx.book().outline(), "Book[B[C, D], E]");
        ctx.book().tree().validate().unwrap();
    }

    #[test]
    fn test_replaced_step_swaps_back_and_forth() {
        let mut ctx = create_test_context();
        let root = ctx.book().root();
        let a = find(&ctx, "A");
        let x = ctx.new_chapter("X");
        ctx.replace_chapter(root, 0, x, true).unwrap();

        let command = Command::new("Replace", Selection::empty()).with_step(Step::Replaced {
            parent: root,
            index: 0,
            previous: a,
            current: x,
        });
        let inverse = command.revert(&mut ctx).unwrap();
        assert_eq!(ctx.book().outline(), "Book[A, B[C, D], E]");
        inverse.revert(&mut ctx).unwrap();
        assert_eq!(ctx.book().outline(), "Book[X, B[C, D], E]");

        let held: HashSet<ChapterId> = command.chapters().collect();
        assert!(held.contains(&a) && held.contains(&x));
    }
}
