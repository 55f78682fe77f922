//! Error types for editing operations

use doc_model::ChapterId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Chapter {chapter} is not at index {index} of {parent}")]
    IndexMismatch {
        chapter: ChapterId,
        parent: ChapterId,
        index: usize,
    },

    #[error("Chapter {0} is not attached to the book")]
    NotAttached(ChapterId),

    #[error("Cannot paste chapter {0} into itself or one of its descendants")]
    PasteIntoSelf(ChapterId),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Undo stack is empty")]
    UndoStackEmpty,

    #[error("Redo stack is empty")]
    RedoStackEmpty,
}

pub type Result<T> = std::result::Result<T, EditError>;
