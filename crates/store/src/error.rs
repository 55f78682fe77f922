//! Error types for storage operations

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Edit error: {0}")]
    Edit(#[from] edit_engine::EditError),

    #[error("No format registered for {0}")]
    UnsupportedFormat(String),

    #[error("Failed to write {}: {message}", path.display())]
    Make { path: PathBuf, message: String },

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
