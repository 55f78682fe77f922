//! Mutation API - the only path through which the chapter tree changes
//!
//! Each call validates its arguments before touching the tree, applies the
//! change, updates document status and emits exactly one structural event.
//! The values returned (or the arguments themselves) are what an undo
//! record needs to reverse the call.

use crate::{DocumentContext, EditError, Result, TreeEvent};
use doc_model::{AttributeSnapshot, AttributeValue, Attributes, ChapterId, DocModelError};
use std::collections::{BTreeMap, HashSet};

fn check_ascending(indices: &[usize]) -> Result<()> {
    if indices.windows(2).any(|w| w[0] >= w[1]) {
        return Err(EditError::InvalidCommand(format!(
            "indices must be strictly ascending: {:?}",
            indices
        )));
    }
    Ok(())
}

impl DocumentContext {
    /// Insert detached `chapters` under `target` so that they end up at `indices`.
    ///
    /// `indices` are the final positions, strictly ascending. Insertion runs
    /// from the last chapter to the first, each at its position among the
    /// pre-existing children, so no insertion shifts another's target.
    ///
    /// # Panics
    ///
    /// Panics if `chapters` and `indices` differ in length.
    pub fn insert_chapters_into(
        &mut self,
        chapters: &[ChapterId],
        target: ChapterId,
        indices: &[usize],
        track_modified: bool,
    ) -> Result<()> {
        assert_eq!(
            chapters.len(),
            indices.len(),
            "chapters and indices must have the same length"
        );
        check_ascending(indices)?;

        let tree = self.book().tree();
        let existing = tree
            .get(target)
            .ok_or(DocModelError::ChapterNotFound(target))?
            .children()
            .len();
        let final_len = existing + chapters.len();
        if let Some(&last) = indices.last() {
            if last >= final_len {
                return Err(DocModelError::IndexOutOfBounds {
                    parent: target,
                    index: last,
                    len: final_len,
                }
                .into());
            }
        }

        let mut seen = HashSet::new();
        for &chapter in chapters {
            let c = tree
                .get(chapter)
                .ok_or(DocModelError::ChapterNotFound(chapter))?;
            if c.parent().is_some() || chapter == self.book().root() {
                return Err(DocModelError::AlreadyAttached(chapter).into());
            }
            if tree.is_ancestor(chapter, target) {
                return Err(DocModelError::CycleDetected {
                    parent: target,
                    child: chapter,
                }
                .into());
            }
            if !seen.insert(chapter) {
                return Err(EditError::InvalidCommand(format!(
                    "chapter {} listed twice",
                    chapter
                )));
            }
        }

        for (k, (&chapter, &index)) in chapters.iter().zip(indices).enumerate().rev() {
            self.book_mut().tree_mut().insert(target, index - k, chapter)?;
        }

        self.touch(track_modified);
        self.emit(TreeEvent::ChaptersInserted {
            parent: target,
            indices: indices.to_vec(),
            chapters: chapters.to_vec(),
        });
        Ok(())
    }

    /// Detach `chapters`, currently at `indices` of `parent`.
    ///
    /// Removal runs from the highest index down. Open editors and cut
    /// clipboard entries for the removed subtrees are released, with their
    /// own events, before the removal event goes out.
    ///
    /// # Panics
    ///
    /// Panics if `chapters` and `indices` differ in length.
    pub fn remove_chapters_from(
        &mut self,
        chapters: &[ChapterId],
        parent: ChapterId,
        indices: &[usize],
        track_modified: bool,
    ) -> Result<()> {
        assert_eq!(
            chapters.len(),
            indices.len(),
            "chapters and indices must have the same length"
        );
        check_ascending(indices)?;
        self.require(parent)?;

        let tree = self.book().tree();
        for (&chapter, &index) in chapters.iter().zip(indices) {
            if tree.chapter_at(parent, index) != Some(chapter) {
                return Err(EditError::IndexMismatch {
                    chapter,
                    parent,
                    index,
                });
            }
        }

        for &index in indices.iter().rev() {
            self.book_mut().tree_mut().remove_at(parent, index)?;
        }

        for &chapter in chapters {
            self.release_references(chapter);
        }
        self.prune_selection();
        self.touch(track_modified);
        self.emit(TreeEvent::ChaptersRemoved {
            parent,
            indices: indices.to_vec(),
            chapters: chapters.to_vec(),
        });
        Ok(())
    }

    /// Swap the child of `parent` at `index` for a detached chapter.
    ///
    /// Returns the chapter that was replaced, now detached.
    pub fn replace_chapter(
        &mut self,
        parent: ChapterId,
        index: usize,
        chapter: ChapterId,
        track_modified: bool,
    ) -> Result<ChapterId> {
        if chapter == self.book().root() {
            return Err(DocModelError::AlreadyAttached(chapter).into());
        }
        let old = self.book_mut().tree_mut().replace(parent, index, chapter)?;

        self.release_references(old);
        self.prune_selection();
        self.touch(track_modified);
        self.emit(TreeEvent::StructureReplaced(parent));
        Ok(old)
    }

    /// Apply `new_attrs` to a chapter and return what they overwrote.
    ///
    /// With `remove_present` the whole attribute map is snapshotted and
    /// cleared first, so restoring the snapshot brings back exactly the
    /// prior map. Otherwise only the keys in `new_attrs` are snapshotted and
    /// unrelated attributes are left alone.
    pub fn update_chapter_attributes(
        &mut self,
        chapter: ChapterId,
        new_attrs: Attributes,
        remove_present: bool,
    ) -> Result<AttributeSnapshot> {
        let values = new_attrs.into_iter().map(|(k, v)| (k, Some(v))).collect();
        self.apply_attributes(chapter, values, remove_present, true)
    }

    /// Put back a snapshot returned by an earlier attribute update.
    ///
    /// Returns the snapshot of the values it overwrote, which restores the
    /// state before this call. Does not mark the document modified.
    pub fn restore_attributes(
        &mut self,
        chapter: ChapterId,
        snapshot: &AttributeSnapshot,
    ) -> Result<AttributeSnapshot> {
        self.apply_attributes(chapter, snapshot.values.clone(), snapshot.replace_all, false)
    }

    fn apply_attributes(
        &mut self,
        chapter: ChapterId,
        values: BTreeMap<String, Option<AttributeValue>>,
        replace_all: bool,
        track_modified: bool,
    ) -> Result<AttributeSnapshot> {
        let c = self
            .book_mut()
            .tree_mut()
            .get_mut(chapter)
            .ok_or(DocModelError::ChapterNotFound(chapter))?;

        let snapshot = if replace_all {
            let snapshot = AttributeSnapshot::whole(c.attributes());
            c.clear_attributes();
            snapshot
        } else {
            AttributeSnapshot::of_keys(c.attributes(), values.keys())
        };

        for (key, value) in values {
            match value {
                Some(value) => {
                    c.set_attribute(key, value);
                }
                None => {
                    c.remove_attribute(&key);
                }
            }
        }

        self.touch(track_modified);
        self.emit(TreeEvent::ChapterUpdated(chapter));
        Ok(snapshot)
    }
}
