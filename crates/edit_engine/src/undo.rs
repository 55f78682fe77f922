//! Undo/redo manager with a bounded, linear history

use crate::{Command, DocumentContext, EditError, EngineConfig, Result};
use doc_model::ChapterId;
use std::collections::HashSet;

/// Manages undo and redo stacks
#[derive(Debug)]
pub struct UndoManager {
    /// Stack of commands that can be undone, most recent last
    undo_stack: Vec<Command>,
    /// Stack of commands that can be redone, most recent last
    redo_stack: Vec<Command>,
    /// Maximum number of undo entries
    max_entries: usize,
    /// Whether entries were dropped since the last `take_discarded`
    discarded: bool,
}

impl UndoManager {
    /// Create a new undo manager
    pub fn new() -> Self {
        Self::with_limits(EngineConfig::default().max_undo_entries)
    }

    /// Create with a custom history size
    pub fn with_limits(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
            discarded: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_limits(config.max_undo_entries)
    }

    /// Record a command that has just been applied.
    ///
    /// Clears the redo stack. Empty commands are ignored.
    pub fn commit(&mut self, command: Command) {
        if command.is_empty() {
            return;
        }
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            self.discarded = true;
        }

        tracing::debug!(message = command.message(), depth = self.undo_stack.len() + 1, "commit");
        self.undo_stack.push(command);
        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        if self.undo_stack.len() > self.max_entries {
            let excess = self.undo_stack.len() - self.max_entries;
            self.undo_stack.drain(..excess);
            self.discarded = true;
        }
    }

    /// Reverse the most recent command and move its inverse to the redo stack
    pub fn undo(&mut self, ctx: &mut DocumentContext) -> Result<()> {
        let command = self.undo_stack.pop().ok_or(EditError::UndoStackEmpty)?;
        match command.revert(ctx) {
            Ok(inverse) => {
                tracing::debug!(message = command.message(), "undo");
                self.redo_stack.push(inverse);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(message = command.message(), error = %err, "undo failed");
                self.undo_stack.push(command);
                Err(err)
            }
        }
    }

    /// Re-apply the most recently undone command
    pub fn redo(&mut self, ctx: &mut DocumentContext) -> Result<()> {
        let command = self.redo_stack.pop().ok_or(EditError::RedoStackEmpty)?;
        match command.revert(ctx) {
            Ok(inverse) => {
                tracing::debug!(message = command.message(), "redo");
                self.undo_stack.push(inverse);
                self.enforce_limit();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(message = command.message(), error = %err, "redo failed");
                self.redo_stack.push(command);
                Err(err)
            }
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label for the pending undo, e.g. `Undo Paste`
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack
            .last()
            .map(|c| format!("Undo {}", c.message()))
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack
            .last()
            .map(|c| format!("Redo {}", c.message()))
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        if self.can_undo() || self.can_redo() {
            self.discarded = true;
        }
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Chapters referenced by any command still in the history
    pub fn retained(&self) -> HashSet<ChapterId> {
        self.undo_stack
            .iter()
            .chain(&self.redo_stack)
            .flat_map(|c| c.chapters())
            .collect()
    }

    /// Report and reset whether history was dropped since the last call
    pub fn take_discarded(&mut self) -> bool {
        std::mem::take(&mut self.discarded)
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
