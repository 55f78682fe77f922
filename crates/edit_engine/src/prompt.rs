//! Yes/no gates surfaced to the caller
//!
//! Some operations need the user's consent before they change anything.
//! Declining always aborts the operation with no state change.

use doc_model::ChapterId;
use std::path::PathBuf;

/// A question asked before a user-cancelable operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Pasting into a leaf turns it into a section
    MakeSection { target: ChapterId, title: String },
    /// An export destination already exists
    Overwrite { path: PathBuf },
}

impl Prompt {
    /// Human readable question
    pub fn message(&self) -> String {
        match self {
            Prompt::MakeSection { title, .. } => {
                format!("\"{}\" has no sub-chapters. Make it a section?", title)
            }
            Prompt::Overwrite { path } => {
                format!("{} already exists. Overwrite it?", path.display())
            }
        }
    }
}

/// Answers prompts on behalf of the user
pub trait Prompter {
    fn confirm(&mut self, prompt: &Prompt) -> bool;
}

impl<F> Prompter for F
where
    F: FnMut(&Prompt) -> bool,
{
    fn confirm(&mut self, prompt: &Prompt) -> bool {
        self(prompt)
    }
}
