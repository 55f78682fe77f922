//! Command execution engine
//!
//! [`EditingEngine`] turns user intents into Mutation API calls and records
//! one undo command per intent. It is the single writer for its document.

use crate::{
    Command, DocumentContext, EditError, EngineConfig, EventSink, PasteOutcome, Prompt, Prompter,
    Result, Step, UndoItem, UndoManager,
};
use doc_model::{
    AttributeValue, Attributes, Book, ChapterDraft, ChapterId, Content, DocModelError, TITLE,
};

/// The main editing engine that manages document state and command execution
#[derive(Debug)]
pub struct EditingEngine {
    /// Current document and its editing state
    context: DocumentContext,
    /// Undo manager
    history: UndoManager,
}

impl EditingEngine {
    /// Create an editing engine around a book
    pub fn new(book: Book) -> Self {
        Self::with_config(book, &EngineConfig::default())
    }

    pub fn with_config(book: Book, config: &EngineConfig) -> Self {
        Self {
            context: DocumentContext::new(book),
            history: UndoManager::from_config(config),
        }
    }

    pub fn context(&self) -> &DocumentContext {
        &self.context
    }

    pub fn book(&self) -> &Book {
        self.context.book()
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.context.subscribe(sink);
    }

    pub fn mark_saved(&mut self) {
        self.context.mark_saved();
    }

    /// Record an applied command and release whatever history it displaced
    fn commit(&mut self, command: Command) {
        self.history.commit(command);
        self.release_discarded();
    }

    fn release_discarded(&mut self) {
        if self.history.take_discarded() {
            self.context.release_unreferenced(self.history.retained());
        }
    }

    /// Focus the given attached chapters
    pub fn set_selection(&mut self, chapters: &[ChapterId]) {
        self.context.select(chapters);
    }

    /// Create a titled chapter under `parent`, at the end unless `index` is given
    pub fn create_chapter(
        &mut self,
        parent: ChapterId,
        index: Option<usize>,
        title: &str,
    ) -> Result<ChapterId> {
        self.context.require_attached(parent)?;
        let len = self.book().tree().children_of(parent).len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(DocModelError::IndexOutOfBounds { parent, index, len }.into());
        }

        let selection = self.context.selection().clone();
        let id = self.context.new_chapter(title);
        self.context.insert_chapters_into(&[id], parent, &[index], true)?;
        self.context.select(&[id]);
        self.commit(
            Command::new("New Chapter", selection)
                .with_step(Step::Inserted(UndoItem::new(parent, vec![id], vec![index]))),
        );
        Ok(id)
    }

    /// Remove chapters and their subtrees from the book as one command
    pub fn delete(&mut self, chapters: &[ChapterId]) -> Result<()> {
        let groups = UndoItem::locate(self.book(), chapters)?;
        if groups.is_empty() {
            return Ok(());
        }

        let mut command = Command::new("Delete", self.context.selection().clone());
        for group in groups {
            if let Err(err) = self.context.remove_chapters_from(
                &group.chapters,
                group.parent,
                &group.indices,
                true,
            ) {
                command.abandon(&mut self.context);
                return Err(err);
            }
            command.push(Step::Removed(group));
        }
        self.commit(command);
        Ok(())
    }

    /// Change only the title of a chapter
    pub fn rename(&mut self, chapter: ChapterId, title: &str) -> Result<()> {
        let mut attrs = Attributes::new();
        attrs.insert(TITLE.to_string(), AttributeValue::Text(title.to_string()));
        self.update_attributes("Rename", chapter, attrs, false)
    }

    /// Apply attributes from an editing surface
    pub fn edit_attributes(
        &mut self,
        chapter: ChapterId,
        attrs: Attributes,
        remove_present: bool,
    ) -> Result<()> {
        self.update_attributes("Edit Attributes", chapter, attrs, remove_present)
    }

    fn update_attributes(
        &mut self,
        message: &str,
        chapter: ChapterId,
        attrs: Attributes,
        remove_present: bool,
    ) -> Result<()> {
        self.context.require(chapter)?;
        let selection = self.context.selection().clone();
        let snapshot = self
            .context
            .update_chapter_attributes(chapter, attrs, remove_present)?;
        self.commit(Command::new(message, selection).with_step(Step::Attributes { chapter, snapshot }));
        Ok(())
    }

    /// Merge leaf chapters into one, placed where the first of them was.
    ///
    /// Chapters are joined in document order and their texts separated by a
    /// newline. The new chapter keeps the first chapter's attributes, with
    /// `title` overriding its title when given.
    pub fn join(&mut self, chapters: &[ChapterId], title: Option<&str>) -> Result<ChapterId> {
        let book = self.book();
        let order = book.document_order();
        let mut sorted = Vec::with_capacity(chapters.len());
        for &id in chapters {
            self.context.require_attached(id)?;
            if id == book.root() {
                return Err(DocModelError::RootChapter("joined").into());
            }
            if book.tree().children_of(id).first().is_some() {
                return Err(EditError::InvalidCommand(format!(
                    "cannot join section {}",
                    id
                )));
            }
            if !sorted.contains(&id) {
                sorted.push(id);
            }
        }
        if sorted.len() < 2 {
            return Err(EditError::InvalidCommand(
                "join needs at least two chapters".to_string(),
            ));
        }
        sorted.sort_by_key(|id| order.iter().position(|o| o == id));

        let mut texts = Vec::with_capacity(sorted.len());
        for &id in &sorted {
            match book.chapter(id).map(|c| c.content()) {
                Some(Content::Text(text)) => texts.push(text.as_str()),
                Some(Content::Empty) | None => {}
                Some(Content::File(_)) => {
                    return Err(EditError::InvalidCommand(format!(
                        "cannot join file-backed chapter {}",
                        id
                    )));
                }
            }
        }

        let first = sorted[0];
        let mut draft = book.to_draft(first).unwrap_or_default();
        draft.content = Content::Text(texts.join("\n"));
        if let Some(title) = title {
            draft
                .attributes
                .insert(TITLE.to_string(), AttributeValue::Text(title.to_string()));
        }
        let parent = book
            .tree()
            .parent_of(first)
            .ok_or(EditError::NotAttached(first))?;
        let index = book
            .tree()
            .index_of(parent, first)
            .ok_or(EditError::NotAttached(first))?;
        let groups = UndoItem::locate(book, &sorted)?;

        let mut command = Command::new("Join", self.context.selection().clone());
        let joined = self.context.instantiate(&draft);
        let applied = self.apply_join(groups, parent, index, joined, &mut command);
        if let Err(err) = applied {
            command.abandon(&mut self.context);
            return Err(err);
        }
        self.context.select(&[joined]);
        self.commit(command);
        Ok(joined)
    }

    fn apply_join(
        &mut self,
        groups: Vec<UndoItem>,
        parent: ChapterId,
        index: usize,
        joined: ChapterId,
        command: &mut Command,
    ) -> Result<()> {
        for group in groups {
            self.context
                .remove_chapters_from(&group.chapters, group.parent, &group.indices, true)?;
            command.push(Step::Removed(group));
        }
        self.context
            .insert_chapters_into(&[joined], parent, &[index], true)?;
        command.push(Step::Inserted(UndoItem::new(parent, vec![joined], vec![index])));
        Ok(())
    }

    /// Swap a chapter for a subtree built from `draft`
    pub fn replace_chapter(&mut self, chapter: ChapterId, draft: &ChapterDraft) -> Result<ChapterId> {
        self.context.require_attached(chapter)?;
        let tree = self.book().tree();
        let Some(parent) = tree.parent_of(chapter) else {
            return Err(DocModelError::RootChapter("replaced").into());
        };
        let index = tree
            .index_of(parent, chapter)
            .ok_or(EditError::NotAttached(chapter))?;

        let selection = self.context.selection().clone();
        let current = self.context.instantiate(draft);
        let previous = self.context.replace_chapter(parent, index, current, true)?;
        self.context.select(&[current]);
        self.commit(Command::new("Replace", selection).with_step(Step::Replaced {
            parent,
            index,
            previous,
            current,
        }));
        Ok(current)
    }

    pub fn cut(&mut self, chapters: &[ChapterId]) -> Result<()> {
        self.context.cut_to_clipboard(chapters)?;
        self.context.release_unreferenced(self.history.retained());
        Ok(())
    }

    pub fn copy(&mut self, chapters: &[ChapterId]) -> Result<()> {
        self.context.copy_to_clipboard(chapters)?;
        self.context.release_unreferenced(self.history.retained());
        Ok(())
    }

    pub fn can_paste(&self) -> bool {
        self.context.clipboard().can_paste()
    }

    /// Paste the clipboard under `target`.
    ///
    /// A leaf target other than the root only becomes a section if
    /// `prompter` agrees.
    pub fn paste(
        &mut self,
        target: ChapterId,
        prompter: &mut impl Prompter,
    ) -> Result<PasteOutcome> {
        if !self.can_paste() {
            return Ok(PasteOutcome::NothingToPaste);
        }
        self.context.require_attached(target)?;

        let book = self.book();
        if target != book.root() && book.tree().children_of(target).is_empty() {
            let prompt = Prompt::MakeSection {
                target,
                title: book.title(target).to_string(),
            };
            if !prompter.confirm(&prompt) {
                tracing::debug!(%target, "paste declined");
                return Ok(PasteOutcome::Declined);
            }
        }

        match self.context.paste_clipboard(target)? {
            Some(command) => {
                let pasted = self.context.selected_chapters();
                self.commit(command);
                Ok(PasteOutcome::Pasted(pasted))
            }
            None => Ok(PasteOutcome::NothingToPaste),
        }
    }

    /// Undo the last command
    pub fn undo(&mut self) -> Result<()> {
        self.history.undo(&mut self.context)
    }

    /// Redo the last undone command
    pub fn redo(&mut self) -> Result<()> {
        self.history.redo(&mut self.context)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history.redo_description()
    }

    /// Forget all history and free the chapters only it was keeping
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.release_discarded();
    }

    /// Append an imported subtree to `target` as one undoable command
    pub fn import_draft(
        &mut self,
        target: ChapterId,
        draft: &ChapterDraft,
        label: &str,
    ) -> Result<ChapterId> {
        self.context.require_attached(target)?;
        let index = self.book().tree().children_of(target).len();

        let selection = self.context.selection().clone();
        let id = self.context.instantiate(draft);
        self.context.insert_chapters_into(&[id], target, &[index], true)?;
        self.context.select(&[id]);
        self.commit(
            Command::new(format!("Import {}", label), selection)
                .with_step(Step::Inserted(UndoItem::new(target, vec![id], vec![index]))),
        );
        Ok(id)
    }

    /// Snapshot a chapter subtree for a background export
    pub fn export_snapshot(&self, chapter: ChapterId) -> Result<ChapterDraft> {
        self.book()
            .to_draft(chapter)
            .ok_or_else(|| DocModelError::ChapterNotFound(chapter).into())
    }

    pub fn open_editor(&mut self, chapter: ChapterId) -> Result<()> {
        self.context.open_editor(chapter)
    }

    pub fn close_editor(&mut self, chapter: ChapterId) -> bool {
        self.context.close_editor(chapter)
    }
}
