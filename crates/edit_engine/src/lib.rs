//! Edit Engine - Mutation API, undo/redo, clipboard and selection tracking
//!
//! Every change to a book goes through [`DocumentContext`]'s mutation
//! methods. [`EditingEngine`] layers user-level intents on top and records
//! each one as a single [`Command`] on the [`UndoManager`].

mod clipboard;
mod command;
mod config;
mod context;
mod error;
mod event;
mod executor;
mod mutation;
mod prompt;
mod undo;

pub use clipboard::*;
pub use command::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use event::*;
pub use executor::*;
pub use prompt::*;
pub use undo::*;
