//! Store - Formats, background import/export, settings and logging
//!
//! This crate feeds the editing engine from the outside world: it parses
//! and writes chapter drafts off the editor thread, defines the application
//! settings and installs the log subscriber.

mod error;
mod format;
mod logging;
mod settings;
mod task;

pub use error::*;
pub use format::*;
pub use logging::*;
pub use settings::*;
pub use task::*;
