//! Chapter and document identifiers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle to a chapter slot in a [`ChapterTree`](crate::ChapterTree) arena.
///
/// The generation changes every time a slot is freed, so a handle that
/// outlives its chapter never resolves to whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChapterId {
    index: u32,
    generation: u32,
}

impl ChapterId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the arena
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Unique identifier for an open document.
/// Uses UUID v4 so identifiers stay unique across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a new random DocumentId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Create a DocumentId from a string representation
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_string_roundtrip() {
        let id = DocumentId::new();
        let parsed = DocumentId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(DocumentId::from_string("not-a-uuid").is_none());
    }

    #[test]
    fn test_chapter_id_display() {
        let id = ChapterId::new(3, 7);
        assert_eq!(id.to_string(), "#3v7");
        assert_eq!(id.index(), 3);
        assert_eq!(id.generation(), 7);
    }
}
