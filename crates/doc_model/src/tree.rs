//! Chapter arena and structural tree operations

use crate::{
    AttributeValue, Attributes, Chapter, ChapterId, Content, DocModelError, Result, TITLE,
};
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    chapter: Option<Chapter>,
}

/// Arena owning every chapter of a document, attached or not.
///
/// Chapters that are removed from their parent stay in the arena as
/// detached subtrees until [`ChapterTree::sweep`] releases them, which lets
/// undo history and the clipboard hold on to removed chapters by handle.
#[derive(Debug, Clone, Default)]
pub struct ChapterTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl ChapterTree {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live chapters, attached or detached
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocate a new detached chapter
    pub fn create(&mut self, attributes: Attributes, content: Content) -> ChapterId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let id = ChapterId::new(index, slot.generation);
            slot.chapter = Some(Chapter::new(id, attributes, content));
            return id;
        }

        let index = self.slots.len() as u32;
        let id = ChapterId::new(index, 0);
        self.slots.push(Slot {
            generation: 0,
            chapter: Some(Chapter::new(id, attributes, content)),
        });
        id
    }

    /// Allocate a new detached chapter with only a title
    pub fn create_titled(&mut self, title: impl Into<String>) -> ChapterId {
        let mut attributes = Attributes::new();
        attributes.insert(TITLE.to_string(), AttributeValue::Text(title.into()));
        self.create(attributes, Content::Empty)
    }

    /// Get a chapter by handle
    pub fn get(&self, id: ChapterId) -> Option<&Chapter> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.chapter.as_ref())
    }

    /// Get a mutable chapter by handle
    pub fn get_mut(&mut self, id: ChapterId) -> Option<&mut Chapter> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.chapter.as_mut())
    }

    pub fn contains(&self, id: ChapterId) -> bool {
        self.get(id).is_some()
    }

    fn chapter(&self, id: ChapterId) -> Result<&Chapter> {
        self.get(id).ok_or(DocModelError::ChapterNotFound(id))
    }

    fn chapter_mut(&mut self, id: ChapterId) -> Result<&mut Chapter> {
        self.get_mut(id).ok_or(DocModelError::ChapterNotFound(id))
    }

    pub fn parent_of(&self, id: ChapterId) -> Option<ChapterId> {
        self.get(id).and_then(Chapter::parent)
    }

    /// Children of a chapter (empty for a leaf or an unknown handle)
    pub fn children_of(&self, id: ChapterId) -> &[ChapterId] {
        self.get(id).map(Chapter::children).unwrap_or(&[])
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors
    pub fn is_ancestor(&self, ancestor: ChapterId, id: ChapterId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent_of(c);
        }
        false
    }

    /// Insert a detached chapter under `parent` at `index`
    pub fn insert(&mut self, parent: ChapterId, index: usize, child: ChapterId) -> Result<()> {
        let len = self.chapter(parent)?.children().len();
        if self.chapter(child)?.parent().is_some() {
            return Err(DocModelError::AlreadyAttached(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(DocModelError::CycleDetected { parent, child });
        }
        if index > len {
            return Err(DocModelError::IndexOutOfBounds { parent, index, len });
        }

        self.chapter_mut(parent)?.children_mut().insert(index, child);
        self.chapter_mut(child)?.set_parent(Some(parent));
        Ok(())
    }

    /// Append a detached chapter as the last child of `parent`
    pub fn append(&mut self, parent: ChapterId, child: ChapterId) -> Result<()> {
        let len = self.chapter(parent)?.children().len();
        self.insert(parent, len, child)
    }

    /// Detach and return the child of `parent` at `index`
    pub fn remove_at(&mut self, parent: ChapterId, index: usize) -> Result<ChapterId> {
        let children = self.chapter_mut(parent)?.children_mut();
        if index >= children.len() {
            return Err(DocModelError::IndexOutOfBounds {
                parent,
                index,
                len: children.len(),
            });
        }
        let child = children.remove(index);
        self.chapter_mut(child)?.set_parent(None);
        Ok(child)
    }

    pub fn index_of(&self, parent: ChapterId, child: ChapterId) -> Option<usize> {
        self.children_of(parent).iter().position(|&c| c == child)
    }

    pub fn chapter_at(&self, parent: ChapterId, index: usize) -> Option<ChapterId> {
        self.children_of(parent).get(index).copied()
    }

    /// Swap the child at `index` for a detached chapter, returning the old child
    pub fn replace(&mut self, parent: ChapterId, index: usize, chapter: ChapterId) -> Result<ChapterId> {
        let len = self.chapter(parent)?.children().len();
        if index >= len {
            return Err(DocModelError::IndexOutOfBounds { parent, index, len });
        }
        if self.chapter(chapter)?.parent().is_some() {
            return Err(DocModelError::AlreadyAttached(chapter));
        }
        if self.is_ancestor(chapter, parent) {
            return Err(DocModelError::CycleDetected {
                parent,
                child: chapter,
            });
        }

        let old = std::mem::replace(&mut self.chapter_mut(parent)?.children_mut()[index], chapter);
        self.chapter_mut(old)?.set_parent(None);
        self.chapter_mut(chapter)?.set_parent(Some(parent));
        Ok(old)
    }

    /// Duplicate a leaf chapter's attributes and content into a new detached chapter.
    ///
    /// Sections are refused: their children may share file resources that
    /// have no defined duplication policy.
    pub fn copy(&mut self, id: ChapterId) -> Result<ChapterId> {
        let source = self.chapter(id)?;
        if source.is_section() {
            return Err(DocModelError::SectionNotCopyable(id));
        }
        let attributes = source.attributes().clone();
        let content = source.content().clone();
        Ok(self.create(attributes, content))
    }

    pub fn attribute(&self, id: ChapterId, key: &str) -> Option<&AttributeValue> {
        self.get(id).and_then(|c| c.attribute(key))
    }

    pub fn set_attribute(
        &mut self,
        id: ChapterId,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<Option<AttributeValue>> {
        Ok(self.chapter_mut(id)?.set_attribute(key, value))
    }

    pub fn remove_attribute(&mut self, id: ChapterId, key: &str) -> Result<Option<AttributeValue>> {
        Ok(self.chapter_mut(id)?.remove_attribute(key))
    }

    pub fn clear_attributes(&mut self, id: ChapterId) -> Result<Attributes> {
        Ok(self.chapter_mut(id)?.clear_attributes())
    }

    /// Handles from the topmost ancestor down to `id`
    pub fn path_to(&self, id: ChapterId) -> Option<Vec<ChapterId>> {
        self.get(id)?;
        let mut path = vec![id];
        let mut current = self.parent_of(id);
        while let Some(c) = current {
            path.push(c);
            current = self.parent_of(c);
        }
        path.reverse();
        Some(path)
    }

    /// `id` and all of its descendants, in pre-order
    pub fn descendants(&self, id: ChapterId) -> Vec<ChapterId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children_of(current).iter().rev().copied());
        }
        out
    }

    /// Release every detached subtree that contains no retained chapter.
    ///
    /// `root` is never released. Freed slots get a new generation, so stale
    /// handles stop resolving. Returns the number of chapters released.
    pub fn sweep(&mut self, root: ChapterId, retained: &HashSet<ChapterId>) -> usize {
        let detached: Vec<ChapterId> = self
            .slots
            .iter()
            .filter_map(|slot| slot.chapter.as_ref())
            .filter(|c| c.parent().is_none() && c.id() != root)
            .map(Chapter::id)
            .collect();

        let mut released = 0;
        for top in detached {
            let subtree = self.descendants(top);
            if subtree.iter().any(|id| retained.contains(id)) {
                continue;
            }
            for id in subtree {
                self.release(id);
                released += 1;
            }
        }
        released
    }

    fn release(&mut self, id: ChapterId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            if slot.generation == id.generation() && slot.chapter.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index() as u32);
                self.len -= 1;
            }
        }
    }

    /// Check parent/child consistency of the whole arena
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for chapter in self.slots.iter().filter_map(|slot| slot.chapter.as_ref()) {
            for &child in chapter.children() {
                let c = self.get(child).ok_or_else(|| {
                    DocModelError::TreeStructureError(format!(
                        "{} lists missing child {}",
                        chapter.id(),
                        child
                    ))
                })?;
                if c.parent() != Some(chapter.id()) {
                    return Err(DocModelError::TreeStructureError(format!(
                        "{} lists {} whose parent is {:?}",
                        chapter.id(),
                        child,
                        c.parent()
                    )));
                }
                if !seen.insert(child) {
                    return Err(DocModelError::TreeStructureError(format!(
                        "{} has more than one parent",
                        child
                    )));
                }
            }
        }
        Ok(())
    }
}
