//! Error types for chapter tree operations

use crate::ChapterId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocModelError {
    #[error("Chapter not found: {0}")]
    ChapterNotFound(ChapterId),

    #[error("Chapter {0} already has a parent; remove it first")]
    AlreadyAttached(ChapterId),

    #[error("Index {index} out of bounds for chapter {parent} with {len} children")]
    IndexOutOfBounds {
        parent: ChapterId,
        index: usize,
        len: usize,
    },

    #[error("Cannot insert chapter {child} into its own subtree at {parent}")]
    CycleDetected { parent: ChapterId, child: ChapterId },

    #[error("Cannot copy section {0}: chapters with children are not duplicated")]
    SectionNotCopyable(ChapterId),

    #[error("The root chapter cannot be {0}")]
    RootChapter(&'static str),

    #[error("Tree structure error: {0}")]
    TreeStructureError(String),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
