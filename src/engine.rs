//! Sync engine
//!
//! One sync run:
//! 1. Prune `vendored/` of everything not declared
//! 2. Fetch every source concurrently, linking each as it completes
//! 3. Hand deferred links to the elevated helper in one batch
//! 4. Wait for the display to see every source terminal
//!
//! An interrupt only stops the display. Fetches still run to completion and
//! are still linked before [`Engine::sync`] returns.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::CacheLocks;
use crate::error::{Result, VendError};
use crate::event;
use crate::fetch::{FetchContext, FetchJob, SourceOutcome, scheduler};
use crate::link::{LinkPublisher, LinkRequest};
use crate::reconcile::{self, ReconcileReport, VENDORED_DIR};
use crate::source::Registry;
use crate::ui::{self, DisplayMode, ProgressBoard, ProgressReporter, ReporterExit};

/// Options of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Initialize and update submodules after clone or update
    pub recurse_submodules: bool,
    pub display: DisplayMode,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            recurse_submodules: true,
            display: DisplayMode::Interactive,
        }
    }
}

/// Result of a sync run
#[derive(Debug)]
pub struct SyncReport {
    /// One outcome per declared source, in declared order
    pub outcomes: Vec<SourceOutcome>,
    pub reconcile: ReconcileReport,
    /// The display was interrupted before every source finished
    pub interrupted: bool,
}

impl SyncReport {
    /// Sources that ended in `Done(Failure)`
    pub fn failed(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_ok())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn cloned(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.cloned).count()
    }

    /// Per-source errors and warnings, in declared order
    pub fn diagnostics(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .flat_map(|outcome| {
                let source = &outcome.job.source;
                outcome
                    .error
                    .iter()
                    .map(move |error| format!("{source}: {error}"))
                    .chain(outcome.warning().map(|warning| format!("{source}: {warning}")))
            })
            .collect()
    }

    /// Convert into an error when any source failed
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed().count();
        if failed == 0 {
            Ok(self)
        } else {
            Err(VendError::SyncFailed {
                failed,
                total: self.outcomes.len(),
            })
        }
    }
}

/// Keeps one project's `vendored/` directory in sync with a registry
pub struct Engine {
    data_root: PathBuf,
    project_root: PathBuf,
    options: SyncOptions,
    publisher: Arc<LinkPublisher>,
    locks: CacheLocks,
}

impl Engine {
    /// Engine linking the way the running platform requires
    pub fn new(data_root: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            project_root: project_root.into(),
            options: SyncOptions::default(),
            publisher: Arc::new(LinkPublisher::for_platform()),
            locks: CacheLocks::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_publisher(mut self, publisher: LinkPublisher) -> Self {
        self.publisher = Arc::new(publisher);
        self
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn vendored_dir(&self) -> PathBuf {
        self.project_root.join(VENDORED_DIR)
    }

    fn jobs(&self, registry: &Registry) -> Vec<FetchJob> {
        let vendored = self.vendored_dir();
        registry
            .iter()
            .enumerate()
            .map(|(index, source)| FetchJob {
                index,
                cache_path: source.dest_path(&self.data_root),
                link_path: vendored.join(source.short_name()),
                source: source.clone(),
            })
            .collect()
    }

    /// Sync, stopping the display on Ctrl-C
    ///
    /// After the first Ctrl-C a second one exits the process, until this
    /// call returns.
    pub async fn sync(&self, registry: &Registry) -> Result<SyncReport> {
        let latch = ui::InterruptLatch::default();
        let armed = latch.clone();
        let interrupt = async move {
            ui::ctrl_c().await;
            eprintln!("Interrupted: waiting for running fetches to finish (Ctrl-C again to abort)");
            armed.arm();
        };
        let result = self.sync_until(registry, interrupt).await;
        latch.disarm();
        result
    }

    /// Sync, stopping the display when `interrupt` resolves
    pub async fn sync_until<F>(&self, registry: &Registry, interrupt: F) -> Result<SyncReport>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let reconcile = reconcile::reconcile(&self.vendored_dir(), &registry.short_names())?;
        for failure in &reconcile.failures {
            log::warn!("{failure}");
        }

        let jobs = self.jobs(registry);
        if jobs.is_empty() {
            return Ok(SyncReport {
                outcomes: Vec::new(),
                reconcile,
                interrupted: false,
            });
        }

        let names = jobs.iter().map(|job| job.source.short_name()).collect();
        let (tx, rx) = event::channel();
        let reporter = ProgressReporter::new(names, self.options.display);
        let display = tokio::spawn(reporter.run(rx, interrupt));

        let ctx = Arc::new(FetchContext {
            publisher: Arc::clone(&self.publisher),
            locks: self.locks.clone(),
            recurse_submodules: self.options.recurse_submodules,
        });
        let mut outcomes = scheduler::run(jobs, ctx, tx.clone()).await;
        self.finish_deferred(&mut outcomes, &tx);
        drop(tx);

        let interrupted = match display.await {
            Ok((board, exit)) => {
                log_board(&board);
                exit == ReporterExit::Interrupted
            }
            Err(e) => {
                log::warn!("Progress display failed: {e}");
                false
            }
        };

        let report = SyncReport {
            outcomes,
            reconcile,
            interrupted,
        };
        // Logged only now: log lines written while the bars draw garble them
        for line in report.diagnostics() {
            log::warn!("{line}");
        }
        Ok(report)
    }

    fn finish_deferred(&self, outcomes: &mut [SourceOutcome], events: &event::EventSender) {
        if !self.publisher.is_deferred() || !outcomes.iter().any(SourceOutcome::awaits_link) {
            return;
        }

        let flushed = self.publisher.flush().map_err(|e| e.to_string());
        if let Err(reason) = &flushed {
            log::debug!("Elevated link batch failed: {reason}");
        }
        for outcome in outcomes.iter_mut().filter(|o| o.awaits_link()) {
            let request = LinkRequest::new(&outcome.job.cache_path, &outcome.job.link_path);
            let result = match &flushed {
                Ok(_) => LinkPublisher::verify(&request),
                Err(reason) => Err(VendError::LinkFailed {
                    old: request.old.display().to_string(),
                    new: request.new.display().to_string(),
                    reason: reason.clone(),
                }),
            };
            outcome.finish_deferred(result, events);
        }
    }
}

fn log_board(board: &ProgressBoard) {
    for index in 0..board.len() {
        if let (Some(name), Some(label)) = (board.name(index), board.status_label(index)) {
            log::debug!("{name}: {label}");
        }
    }
}

