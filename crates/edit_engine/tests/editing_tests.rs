//! Integration tests for the editing engine
//!
//! These drive an `EditingEngine` the way a UI would: intents in, tree
//! snapshots and notifications out. Snapshots are compared as drafts, so
//! equality covers shape, attributes and content but not chapter identity.

use doc_model::{
    text_chapter, AttributeValue, Attributes, Book, BookDraft, ChapterDraft, ChapterId, AUTHOR,
    TITLE,
};
use edit_engine::{
    ClipboardMode, EditingEngine, EngineConfig, PasteOutcome, Prompt, TreeEvent, UndoItem,
    UndoManager,
};
use proptest::prelude::*;

/// Test harness wrapping an engine over `Book[A, B[C, D]]`
struct EditingHarness {
    engine: EditingEngine,
}

impl EditingHarness {
    fn new() -> Self {
        let draft = ChapterDraft::titled("Book")
            .with_child(text_chapter("A", "alpha"))
            .with_child(
                ChapterDraft::titled("B")
                    .with_child(text_chapter("C", "gamma"))
                    .with_child(text_chapter("D", "delta")),
            );
        Self {
            engine: EditingEngine::new(Book::from_draft(&draft)),
        }
    }

    fn id(&self, title: &str) -> ChapterId {
        self.engine
            .book()
            .find_by_title(title)
            .unwrap_or_else(|| panic!("no chapter titled {}", title))
    }

    fn root(&self) -> ChapterId {
        self.engine.book().root()
    }

    fn outline(&self) -> String {
        self.engine.book().outline()
    }

    fn snapshot(&self) -> BookDraft {
        BookDraft::from(self.engine.book())
    }

    fn paste_confirmed(&mut self, target: ChapterId) -> PasteOutcome {
        self.engine
            .paste(target, &mut |_: &Prompt| true)
            .expect("paste failed")
    }
}

#[test]
fn test_cut_paste_into_leaf_undo_redo() {
    let mut h = EditingHarness::new();
    let a = h.id("A");
    let c = h.id("C");

    h.engine.cut(&[c]).unwrap();
    assert_eq!(h.outline(), "Book[A, B[C, D]]");

    assert_eq!(h.paste_confirmed(a), PasteOutcome::Pasted(vec![c]));
    assert_eq!(h.outline(), "Book[A[C], B[D]]");
    assert!(!h.engine.can_paste());
    assert_eq!(h.engine.undo_description().as_deref(), Some("Undo Paste"));

    h.engine.undo().unwrap();
    assert_eq!(h.outline(), "Book[A, B[C, D]]");

    h.engine.redo().unwrap();
    assert_eq!(h.outline(), "Book[A[C], B[D]]");
    assert_eq!(h.engine.book().tree().parent_of(c), Some(a));
}

#[test]
fn test_copy_paste_keeps_originals() {
    let mut h = EditingHarness::new();
    let root = h.root();
    let c = h.id("C");
    let d = h.id("D");

    h.engine.copy(&[c, d]).unwrap();
    let PasteOutcome::Pasted(copies) = h.paste_confirmed(root) else {
        panic!("expected a paste");
    };

    assert_eq!(h.outline(), "Book[A, B[C, D], C, D]");
    assert_eq!(copies.len(), 2);
    assert!(!copies.contains(&c) && !copies.contains(&d));
    assert_eq!(
        h.engine.book().to_draft(copies[0]),
        h.engine.book().to_draft(c)
    );
    assert_eq!(h.engine.context().clipboard().mode(), Some(ClipboardMode::Copy));

    // A copy-paste is repeatable
    h.paste_confirmed(root);
    assert_eq!(h.outline(), "Book[A, B[C, D], C, D, C, D]");
}

#[test]
fn test_cut_paste_moves_same_identity() {
    let mut h = EditingHarness::new();
    let root = h.root();
    let a = h.id("A");
    let c = h.id("C");

    h.engine.cut(&[a, c]).unwrap();
    let d = h.id("D");
    h.paste_confirmed(d);

    assert_eq!(h.outline(), "Book[B[D[A, C]]]");
    assert_eq!(h.engine.book().tree().children_of(d), &[a, c]);
    assert!(!h.engine.can_paste());
    assert_eq!(h.engine.book().tree().children_of(root).len(), 1);

    h.engine.undo().unwrap();
    assert_eq!(h.outline(), "Book[A, B[C, D]]");
}

#[test]
fn test_deleting_cut_chapter_drops_only_it() {
    let mut h = EditingHarness::new();
    let a = h.id("A");
    let c = h.id("C");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    h.engine.subscribe(Box::new(tx));

    h.engine.cut(&[a, c]).unwrap();
    h.engine.delete(&[a]).unwrap();

    assert!(h.engine.can_paste());
    assert_eq!(h.engine.context().clipboard().chapters(), &[c]);
    assert_eq!(rx.try_recv().unwrap(), TreeEvent::ClipboardEntryDropped(a));
    assert!(matches!(
        rx.try_recv().unwrap(),
        TreeEvent::ChaptersRemoved { chapters, .. } if chapters == vec![a]
    ));
}

#[test]
fn test_removal_closes_editors_before_event() {
    let mut h = EditingHarness::new();
    let root = h.root();
    let b = h.id("B");
    let d = h.id("D");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    h.engine.subscribe(Box::new(tx));

    h.engine.open_editor(d).unwrap();
    h.engine.delete(&[b]).unwrap();

    assert_eq!(rx.try_recv().unwrap(), TreeEvent::EditorClosed(d));
    assert_eq!(
        rx.try_recv().unwrap(),
        TreeEvent::ChaptersRemoved {
            parent: root,
            indices: vec![1],
            chapters: vec![b],
        }
    );
    assert!(rx.try_recv().is_err());
    assert!(!h.engine.context().is_editor_open(d));
}

#[test]
fn test_commit_after_undo_clears_redo() {
    let mut h = EditingHarness::new();
    let root = h.root();
    h.engine.create_chapter(root, None, "E").unwrap();
    h.engine.undo().unwrap();
    assert!(h.engine.can_redo());

    h.engine.create_chapter(root, Some(0), "F").unwrap();
    assert!(!h.engine.can_redo());
    assert_eq!(h.outline(), "Book[F, A, B[C, D]]");
}

#[test]
fn test_title_update_undo_leaves_other_attributes() {
    let mut h = EditingHarness::new();
    let a = h.id("A");
    let mut attrs = Attributes::new();
    attrs.insert(AUTHOR.to_string(), "Ann".into());
    attrs.insert("words".to_string(), 12i64.into());
    h.engine.edit_attributes(a, attrs, false).unwrap();
    let before = h.engine.book().chapter(a).unwrap().attributes().clone();

    let mut title = Attributes::new();
    title.insert(TITLE.to_string(), AttributeValue::Text("New".to_string()));
    h.engine.edit_attributes(a, title, false).unwrap();
    assert_eq!(h.engine.book().title(a), "New");

    h.engine.undo().unwrap();
    assert_eq!(h.engine.book().chapter(a).unwrap().attributes(), &before);

    h.engine.redo().unwrap();
    assert_eq!(h.engine.book().title(a), "New");
    assert_eq!(
        h.engine.book().chapter(a).unwrap().attribute("words"),
        Some(&AttributeValue::Integer(12))
    );
}

#[test]
fn test_whole_attribute_replacement_undo() {
    let mut h = EditingHarness::new();
    let a = h.id("A");
    let before = h.snapshot();

    let mut attrs = Attributes::new();
    attrs.insert(AUTHOR.to_string(), "Bo".into());
    h.engine.edit_attributes(a, attrs, true).unwrap();
    assert_eq!(h.engine.book().title(a), "");

    h.engine.undo().unwrap();
    assert_eq!(h.snapshot(), before);
}

#[test]
fn test_modified_flag_follows_edits_not_undo() {
    let mut h = EditingHarness::new();
    let a = h.id("A");
    assert!(!h.engine.context().is_modified());

    h.engine.rename(a, "Alpha").unwrap();
    assert!(h.engine.context().is_modified());
    h.engine.mark_saved();

    h.engine.undo().unwrap();
    assert!(!h.engine.context().is_modified());
    assert_eq!(h.engine.context().revision(), 2);
}

#[test]
fn test_mutation_api_with_manual_history() {
    let h = EditingHarness::new();
    let root = h.root();
    let b = h.id("B");
    let mut history = UndoManager::from_config(&EngineConfig { max_undo_entries: 5 });
    let mut ctx = edit_engine::DocumentContext::new(h.engine.book().clone());

    let groups = UndoItem::locate(ctx.book(), &[b]).unwrap();
    assert_eq!(groups, vec![UndoItem::new(root, vec![b], vec![1])]);
    let item = groups.into_iter().next().unwrap();
    ctx.remove_chapters_from(&item.chapters, item.parent, &item.indices, true)
        .unwrap();
    history.commit(
        edit_engine::Command::new("Delete", doc_model::Selection::empty())
            .with_step(edit_engine::Step::Removed(item)),
    );

    assert_eq!(ctx.book().outline(), "Book[A]");
    history.undo(&mut ctx).unwrap();
    assert_eq!(ctx.book().outline(), "Book[A, B[C, D]]");
}

#[test]
fn test_selection_restored_by_undo() {
    let mut h = EditingHarness::new();
    let root = h.root();
    let c = h.id("C");
    h.engine.set_selection(&[c]);

    let e = h.engine.create_chapter(root, None, "E").unwrap();
    assert_eq!(h.engine.context().selected_chapters(), vec![e]);

    h.engine.undo().unwrap();
    assert_eq!(h.engine.context().selected_chapters(), vec![c]);

    h.engine.redo().unwrap();
    assert_eq!(h.engine.context().selected_chapters(), vec![e]);
}

#[derive(Debug, Clone)]
enum Op {
    Create { parent: usize, index: usize },
    Delete(usize),
    Rename(usize),
    Replace(usize),
    Join(usize, usize),
    CutPaste { chapter: usize, target: usize },
    CopyPaste { chapter: usize, target: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), any::<usize>()).prop_map(|(parent, index)| Op::Create { parent, index }),
        any::<usize>().prop_map(Op::Delete),
        any::<usize>().prop_map(Op::Rename),
        any::<usize>().prop_map(Op::Replace),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Join(a, b)),
        (any::<usize>(), any::<usize>())
            .prop_map(|(chapter, target)| Op::CutPaste { chapter, target }),
        (any::<usize>(), any::<usize>())
            .prop_map(|(chapter, target)| Op::CopyPaste { chapter, target }),
    ]
}

/// Apply an op; returns whether it recorded a command
fn apply(engine: &mut EditingEngine, op: &Op, step: usize) -> bool {
    let order = engine.book().document_order();
    let pick = |n: usize| order[n % order.len()];
    let mut yes = |_: &Prompt| true;

    let result = match *op {
        Op::Create { parent, index } => {
            let parent = pick(parent);
            let len = engine.book().tree().children_of(parent).len();
            engine
                .create_chapter(parent, Some(index % (len + 1)), &format!("N{}", step))
                .map(|_| ())
        }
        Op::Delete(n) => engine.delete(&[pick(n)]),
        Op::Rename(n) => engine.rename(pick(n), &format!("R{}", step)),
        Op::Replace(n) => engine
            .replace_chapter(pick(n), &text_chapter(&format!("P{}", step), "p"))
            .map(|_| ()),
        Op::Join(a, b) => engine.join(&[pick(a), pick(b)], None).map(|_| ()),
        Op::CutPaste { chapter, target } => engine
            .cut(&[pick(chapter)])
            .and_then(|()| engine.paste(pick(target), &mut yes))
            .map(|_| ()),
        Op::CopyPaste { chapter, target } => engine
            .copy(&[pick(chapter)])
            .and_then(|()| engine.paste(pick(target), &mut yes))
            .map(|_| ()),
    };
    result.is_ok()
}

proptest! {
    #[test]
    fn prop_undo_everything_restores_initial_book(ops in proptest::collection::vec(op_strategy(), 1..25)) {
        let mut h = EditingHarness::new();
        let initial = h.snapshot();
        let mut committed = 0;

        for (step, op) in ops.iter().enumerate() {
            let before = h.snapshot();
            let depth = h.engine.history().undo_depth();
            if apply(&mut h.engine, op, step) && h.engine.history().undo_depth() > depth {
                committed += 1;
                let after = h.snapshot();
                h.engine.undo().unwrap();
                prop_assert_eq!(&h.snapshot(), &before);
                h.engine.redo().unwrap();
                prop_assert_eq!(&h.snapshot(), &after);
            } else {
                prop_assert_eq!(&h.snapshot(), &before);
            }
            prop_assert!(h.engine.book().tree().validate().is_ok());
        }

        let last = h.snapshot();
        prop_assert_eq!(h.engine.history().undo_depth(), committed);
        for _ in 0..committed {
            h.engine.undo().unwrap();
        }
        prop_assert!(!h.engine.can_undo());
        prop_assert_eq!(&h.snapshot(), &initial);

        for _ in 0..committed {
            h.engine.redo().unwrap();
        }
        prop_assert_eq!(&h.snapshot(), &last);
    }
}
