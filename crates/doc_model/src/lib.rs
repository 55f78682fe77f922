//! Document Model - chapter tree structure and types
//!
//! This crate provides the book/chapter tree: a generation-checked arena of
//! chapters with parent back-references, typed attributes, content handles,
//! owned drafts for moving subtrees across threads, and path-based selections.

mod attribute;
mod book;
mod chapter;
mod draft;
mod error;
mod node_id;
mod selection;
mod tree;

pub use attribute::*;
pub use book::*;
pub use chapter::*;
pub use draft::*;
pub use error::*;
pub use node_id::*;
pub use selection::*;
pub use tree::*;
