//! Per-source fetch state machine
//!
//! ```text
//! Pending -> Cloning | Updating -> (Submodules)? -> Linking -> Done(Success | Failure)
//! ```
//!
//! Only a failed clone or a failed link ends in `Done(Failure)`. Update and
//! submodule failures still move on to `Linking`.

use std::fmt;

/// How a source ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Success,
    Failure,
}

/// State of one source during a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Pending,
    Cloning,
    Updating,
    Submodules,
    Linking,
    Done(Completion),
}

/// Input driving a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A usable cache entry exists
    CacheFound,
    /// No usable cache entry exists
    CacheMissing,
    Cloned { submodules: bool },
    CloneFailed,
    Updated { submodules: bool },
    UpdateFailed,
    SubmodulesDone,
    SubmodulesFailed,
    Linked,
    LinkFailed,
}

impl FetchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FetchState::Done(_))
    }

    /// Next state, or `None` when `step` is not valid in this state
    pub fn next(self, step: Step) -> Option<FetchState> {
        use FetchState::{Cloning, Done, Linking, Pending, Submodules, Updating};

        let next = match (self, step) {
            (Pending, Step::CacheMissing) => Cloning,
            (Pending, Step::CacheFound) => Updating,

            (Cloning, Step::Cloned { submodules: true })
            | (Updating, Step::Updated { submodules: true }) => Submodules,
            (Cloning, Step::Cloned { submodules: false })
            | (Updating, Step::Updated { submodules: false } | Step::UpdateFailed)
            | (Submodules, Step::SubmodulesDone | Step::SubmodulesFailed) => Linking,
            (Cloning, Step::CloneFailed) => Done(Completion::Failure),

            (Linking, Step::Linked) => Done(Completion::Success),
            (Linking, Step::LinkFailed) => Done(Completion::Failure),

            _ => return None,
        };
        Some(next)
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Pending => write!(f, "PENDING"),
            FetchState::Cloning => write!(f, "CLONING"),
            FetchState::Updating => write!(f, "UPDATING"),
            FetchState::Submodules => write!(f, "SUBMODULES"),
            FetchState::Linking => write!(f, "LINKING"),
            FetchState::Done(Completion::Success) => write!(f, "DONE(ok)"),
            FetchState::Done(Completion::Failure) => write!(f, "DONE(err)"),
        }
    }
}
