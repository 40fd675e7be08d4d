//! Events streamed from fetchers to the progress reporter

use tokio::sync::mpsc;

/// Final state of one source
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalStatus {
    /// Checkout and link are in place; `warning` carries a non-fatal problem
    /// such as a failed update that left the checkout stale
    Ok { warning: Option<String> },
    /// The source could not be cloned or linked
    Failed(String),
}

impl TerminalStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, TerminalStatus::Ok { .. })
    }
}

/// One event, correlated to its source by declared index
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Transfer progress as a fraction in `0.0..=1.0`
    Progress { index: usize, percent: f64 },
    /// A submodule operation is running
    Submodule { index: usize, message: String },
    /// The source reached its terminal state
    Done { index: usize, status: TerminalStatus },
}

impl SyncEvent {
    pub fn index(&self) -> usize {
        match self {
            SyncEvent::Progress { index, .. }
            | SyncEvent::Submodule { index, .. }
            | SyncEvent::Done { index, .. } => *index,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<SyncEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SyncEvent>;

/// Create the shared channel of one sync run
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
