//! Background import and export
//!
//! Parsing and writing run on blocking worker threads and never touch the
//! live tree. Parsed drafts travel back over a channel; the editor applies
//! each one with [`EditingEngine::import_draft`] as it arrives, so a batch
//! that fails halfway keeps what was already imported.

use crate::{ExportSettings, FormatRegistry, ImportSettings, Result, StoreError};
use doc_model::{ChapterDraft, ChapterId};
use edit_engine::{EditingEngine, Prompt, Prompter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Cooperative cancellation, checked between units of work
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress reported by an import worker
#[derive(Debug)]
pub enum ImportEvent {
    Parsed { path: PathBuf, draft: ChapterDraft },
    Failed { path: PathBuf, message: String },
    /// The batch stopped before `remaining` files were read
    Cancelled { remaining: usize },
    /// Every file was handled
    Finished,
}

/// A running import batch
#[derive(Debug)]
pub struct ImportJob {
    events: mpsc::Receiver<ImportEvent>,
    cancel: CancelFlag,
    handle: JoinHandle<()>,
}

impl ImportJob {
    /// Next progress event; `None` once the worker has exited
    pub async fn next_event(&mut self) -> Option<ImportEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// A source file that could not be imported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of applying an import batch
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Imported subtree roots, in source order
    pub imported: Vec<ChapterId>,
    pub failures: Vec<ImportFailure>,
    pub cancelled: bool,
}

/// Start parsing `sources` on the blocking pool.
///
/// Must be called from within a tokio runtime.
pub fn spawn_import(
    sources: Vec<PathBuf>,
    registry: Arc<FormatRegistry>,
    settings: &ImportSettings,
    cancel: CancelFlag,
) -> ImportJob {
    let (tx, events) = mpsc::channel(settings.queue_size.max(1));
    let stop_on_error = settings.stop_on_error;
    let flag = cancel.clone();

    let handle = tokio::spawn(async move {
        let total = sources.len();
        for (done, path) in sources.into_iter().enumerate() {
            if flag.is_cancelled() {
                tracing::info!(remaining = total - done, "import cancelled");
                let _ = tx
                    .send(ImportEvent::Cancelled {
                        remaining: total - done,
                    })
                    .await;
                return;
            }

            let event = parse_one(&registry, path).await;
            let failed = matches!(event, ImportEvent::Failed { .. });
            if tx.send(event).await.is_err() {
                tracing::debug!("import receiver dropped");
                return;
            }
            if failed && stop_on_error {
                return;
            }
        }
        let _ = tx.send(ImportEvent::Finished).await;
    });

    ImportJob {
        events,
        cancel,
        handle,
    }
}

async fn parse_one(registry: &FormatRegistry, path: PathBuf) -> ImportEvent {
    let parser = match registry.parser_for(&path) {
        Ok(parser) => parser,
        Err(e) => {
            return ImportEvent::Failed {
                path,
                message: e.to_string(),
            }
        }
    };

    let source = path.clone();
    match tokio::task::spawn_blocking(move || parser.parse(&source)).await {
        Ok(Ok(draft)) => ImportEvent::Parsed { path, draft },
        Ok(Err(e)) => ImportEvent::Failed {
            path,
            message: format!("{:#}", e),
        },
        Err(e) => ImportEvent::Failed {
            path,
            message: e.to_string(),
        },
    }
}

/// Apply an import batch to `target` as results arrive.
///
/// Each parsed file becomes its own undoable command. Failures are recorded
/// in the report and never roll back earlier files. Once the job's flag is
/// cancelled, parsed files still queued are dropped without being inserted.
/// A file the engine refuses to insert ends the batch.
pub async fn run_import(
    engine: &mut EditingEngine,
    target: ChapterId,
    mut job: ImportJob,
) -> ImportReport {
    let mut report = ImportReport::default();

    while let Some(event) = job.next_event().await {
        match event {
            ImportEvent::Parsed { path, draft } => {
                if job.cancel_flag().is_cancelled() {
                    tracing::info!(file = %path.display(), "import cancelled before insert");
                    report.cancelled = true;
                    break;
                }
                let label = file_label(&path);
                match engine.import_draft(target, &draft, &label) {
                    Ok(id) => {
                        tracing::info!(file = %path.display(), chapters = draft.count(), "imported");
                        report.imported.push(id);
                    }
                    Err(e) => {
                        tracing::warn!(file = %path.display(), error = %e, "import could not be inserted");
                        job.cancel();
                        report.failures.push(ImportFailure {
                            path,
                            message: e.to_string(),
                        });
                        break;
                    }
                }
            }
            ImportEvent::Failed { path, message } => {
                tracing::warn!(file = %path.display(), %message, "import failed");
                report.failures.push(ImportFailure { path, message });
            }
            ImportEvent::Cancelled { .. } => report.cancelled = true,
            ImportEvent::Finished => break,
        }
    }
    report
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A running export
#[derive(Debug)]
pub struct ExportJob {
    done: oneshot::Receiver<Result<PathBuf>>,
}

impl ExportJob {
    /// Wait for the file to be written
    pub async fn wait(self) -> Result<PathBuf> {
        self.done
            .await
            .map_err(|_| StoreError::Task("export worker exited without reporting".to_string()))?
    }
}

/// Write `draft` to `destination` on the blocking pool.
///
/// Must be called from within a tokio runtime.
pub fn spawn_export(
    draft: ChapterDraft,
    destination: PathBuf,
    registry: &FormatRegistry,
) -> Result<ExportJob> {
    let maker = registry.maker_for(&destination)?;
    let (tx, done) = oneshot::channel();

    tokio::task::spawn_blocking(move || {
        let result = match maker.make(&draft, &destination) {
            Ok(()) => Ok(destination),
            Err(e) => Err(StoreError::Make {
                path: destination,
                message: format!("{:#}", e),
            }),
        };
        let _ = tx.send(result);
    });

    Ok(ExportJob { done })
}

/// What an export request ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// The caller declined to overwrite an existing file
    Declined,
}

/// Export a chapter subtree, asking before an existing file is replaced
pub async fn export_chapter(
    engine: &EditingEngine,
    chapter: ChapterId,
    destination: PathBuf,
    registry: &FormatRegistry,
    settings: &ExportSettings,
    prompter: &mut impl Prompter,
) -> Result<ExportOutcome> {
    if settings.confirm_overwrite && tokio::fs::try_exists(&destination).await? {
        let prompt = Prompt::Overwrite {
            path: destination.clone(),
        };
        if !prompter.confirm(&prompt) {
            tracing::debug!(file = %destination.display(), "export declined");
            return Ok(ExportOutcome::Declined);
        }
    }

    let draft = engine.export_snapshot(chapter)?;
    let path = spawn_export(draft, destination, registry)?.wait().await?;
    tracing::info!(file = %path.display(), "exported");
    Ok(ExportOutcome::Written(path))
}
