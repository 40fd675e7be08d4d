//! Per-source fetching
//!
//! A fetcher takes one declared source from `Pending` to a terminal state:
//! clone or update its cache entry, update submodules, then hand the
//! (cache path, link path) pair to the link publisher. Every fetcher emits
//! exactly one [`SyncEvent::Done`]; when its link is deferred to an elevated
//! batch, that event is sent by [`SourceOutcome::finish_deferred`] instead.
//!
//! ## Module Organization
//!
//! - `state.rs`: states and the transition table
//! - `scheduler.rs`: concurrent fan-out and join

pub mod scheduler;
pub mod state;

pub use state::{Completion, FetchState, Step};

use std::path::PathBuf;
use std::sync::Arc;

use git2::Repository;

use crate::cache::{self, CacheLocks};
use crate::error::{Result, VendError};
use crate::event::{EventSender, SyncEvent, TerminalStatus};
use crate::git::{self, PinnedRef, ProgressWriter};
use crate::link::{LinkPublisher, LinkRequest, LinkStatus};
use crate::source::Source;

/// One unit of work for the scheduler
#[derive(Debug, Clone)]
pub struct FetchJob {
    /// Declared position of the source, used to correlate events
    pub index: usize,
    pub source: Source,
    /// Cache entry under the data root
    pub cache_path: PathBuf,
    /// Entry under `vendored/`
    pub link_path: PathBuf,
}

/// Shared by every fetcher of a sync run
pub struct FetchContext {
    pub publisher: Arc<LinkPublisher>,
    pub locks: CacheLocks,
    pub recurse_submodules: bool,
}

/// Result of one fetcher
#[derive(Debug)]
pub struct SourceOutcome {
    pub job: FetchJob,
    pub state: FetchState,
    /// The cache entry was cloned during this run
    pub cloned: bool,
    pub link: Option<LinkStatus>,
    /// Non-fatal problems, e.g. a failed update
    pub warnings: Vec<String>,
    /// Reason of a `Done(Failure)`
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn new(job: FetchJob) -> Self {
        Self {
            job,
            state: FetchState::Pending,
            cloned: false,
            link: None,
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn index(&self) -> usize {
        self.job.index
    }

    pub fn is_ok(&self) -> bool {
        self.state == FetchState::Done(Completion::Success)
    }

    /// The link was queued and the source still awaits its terminal event
    pub fn awaits_link(&self) -> bool {
        self.link == Some(LinkStatus::Deferred) && !self.state.is_terminal()
    }

    /// Non-fatal problems joined for display
    pub fn warning(&self) -> Option<String> {
        (!self.warnings.is_empty()).then(|| self.warnings.join("; "))
    }

    /// Terminal status, once the state is terminal
    pub fn terminal_status(&self) -> Option<TerminalStatus> {
        match self.state {
            FetchState::Done(Completion::Success) => Some(TerminalStatus::Ok {
                warning: self.warning(),
            }),
            FetchState::Done(Completion::Failure) => Some(TerminalStatus::Failed(
                self.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            )),
            _ => None,
        }
    }

    fn advance(&mut self, step: Step) {
        match self.state.next(step) {
            Some(next) => {
                log::debug!("{}: {} -> {}", self.job.source, self.state, next);
                self.state = next;
            }
            None => log::error!(
                "{}: step {:?} is not valid in state {}",
                self.job.source,
                step,
                self.state
            ),
        }
    }

    fn fail(&mut self, step: Step, error: &VendError) {
        self.error = Some(error.to_string());
        self.advance(step);
    }

    fn emit_done(&self, events: &EventSender) {
        if let Some(status) = self.terminal_status() {
            let _ = events.send(SyncEvent::Done {
                index: self.index(),
                status,
            });
        }
    }

    /// Record the result of a deferred link and emit the terminal event
    pub fn finish_deferred(&mut self, result: Result<()>, events: &EventSender) {
        if !self.awaits_link() {
            return;
        }
        match result {
            Ok(()) => self.advance(Step::Linked),
            Err(e) => {
                log::debug!("{}: {}", self.job.source, e);
                self.fail(Step::LinkFailed, &e);
            }
        }
        self.emit_done(events);
    }

    /// Mark a fetcher that never returned, e.g. after a panic
    pub fn abort(&mut self, reason: String, events: &EventSender) {
        self.error = Some(reason);
        self.state = FetchState::Done(Completion::Failure);
        self.emit_done(events);
    }
}

fn update_submodules(outcome: &mut SourceOutcome, repo: &Repository, writer: &ProgressWriter) {
    match git::update_submodules(repo, writer) {
        Ok(count) => {
            log::debug!("{}: updated {} submodules", outcome.job.source, count);
            outcome.advance(Step::SubmodulesDone);
        }
        Err(e) => {
            log::debug!("{}: {}", outcome.job.source, e);
            outcome.warnings.push(e.to_string());
            outcome.advance(Step::SubmodulesFailed);
        }
    }
}

/// Drive one source to its terminal state
///
/// Blocking: runs libgit2 operations on the calling thread.
pub fn run(job: FetchJob, ctx: &FetchContext, events: &EventSender) -> SourceOutcome {
    let mut outcome = SourceOutcome::new(job);
    let writer = ProgressWriter::new(outcome.index(), events.clone());
    let url = outcome.job.source.url.trim().to_string();
    let cache_path = outcome.job.cache_path.clone();
    let pinned = PinnedRef::parse(&outcome.job.source.reference_name);

    let guard = ctx.locks.lock(&cache_path);

    if cache::is_cached(&cache_path) {
        outcome.advance(Step::CacheFound);
        match git::update_at(&url, &cache_path, &pinned, &writer) {
            Ok(repo) => {
                let submodules = ctx.recurse_submodules && git::has_submodules(&repo);
                outcome.advance(Step::Updated { submodules });
                if submodules {
                    update_submodules(&mut outcome, &repo, &writer);
                }
            }
            Err(e) => {
                // Checkout stays at whatever the cache held
                log::debug!("{}: update failed: {}", outcome.job.source, e);
                outcome.warnings.push(format!("stale: {e}"));
                outcome.advance(Step::UpdateFailed);
            }
        }
    } else {
        outcome.advance(Step::CacheMissing);
        writer.fraction(0.0);
        match git::clone_at(&url, &cache_path, &pinned, &writer) {
            Ok(repo) => {
                outcome.cloned = true;
                let submodules = ctx.recurse_submodules && git::has_submodules(&repo);
                outcome.advance(Step::Cloned { submodules });
                if submodules {
                    update_submodules(&mut outcome, &repo, &writer);
                }
            }
            Err(e) => {
                outcome.fail(Step::CloneFailed, &e);
                outcome.emit_done(events);
                return outcome;
            }
        }
    }

    drop(guard);

    let request = LinkRequest::new(&cache_path, &outcome.job.link_path);
    match ctx.publisher.submit(request) {
        Ok(LinkStatus::Deferred) => {
            outcome.link = Some(LinkStatus::Deferred);
            return outcome;
        }
        Ok(status) => {
            outcome.link = Some(status);
            outcome.advance(Step::Linked);
        }
        Err(e) => {
            log::debug!("{}: {}", outcome.job.source, e);
            outcome.fail(Step::LinkFailed, &e);
        }
    }

    outcome.emit_done(events);
    outcome
}
