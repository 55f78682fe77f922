//! Tree-change notifications
//!
//! Every Mutation API call emits its events after the tree is back in a
//! consistent state. Sinks are invoked synchronously, in subscription order.

use doc_model::ChapterId;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

/// A change that has been applied to the chapter tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// `chapters` now sit under `parent` at `indices`
    ChaptersInserted {
        parent: ChapterId,
        indices: Vec<usize>,
        chapters: Vec<ChapterId>,
    },
    /// `chapters` were detached from `parent`, where they sat at `indices`
    ChaptersRemoved {
        parent: ChapterId,
        indices: Vec<usize>,
        chapters: Vec<ChapterId>,
    },
    /// Attributes or content of a chapter changed
    ChapterUpdated(ChapterId),
    /// One or more children of `parent` were swapped for other chapters
    StructureReplaced(ChapterId),
    /// An open editor for a chapter being removed was closed
    EditorClosed(ChapterId),
    /// A chapter being removed was dropped from a cut clipboard
    ClipboardEntryDropped(ChapterId),
}

/// Receiver of tree-change notifications
pub trait EventSink: Send {
    fn notify(&mut self, event: &TreeEvent);
}

/// Forwards events to another task. A closed receiver is ignored.
impl EventSink for UnboundedSender<TreeEvent> {
    fn notify(&mut self, event: &TreeEvent) {
        let _ = self.send(event.clone());
    }
}

/// Shared in-memory event log, handy for observers that poll
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TreeEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every recorded event, leaving the log empty
    pub fn drain(&self) -> Vec<TreeEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventSink for EventLog {
    fn notify(&mut self, event: &TreeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Ordered list of subscribed sinks
#[derive(Default)]
pub struct EventSinks {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventSinks {
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn emit(&mut self, event: TreeEvent) {
        for sink in &mut self.sinks {
            sink.notify(&event);
        }
    }
}

impl std::fmt::Debug for EventSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSinks").field("len", &self.sinks.len()).finish()
    }
}
