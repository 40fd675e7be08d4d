//! Git operations for cache entries
//!
//! This module handles:
//! - Cloning a source at its pinned reference (shallow for remote URLs)
//! - Updating an existing cache entry in place
//! - Recursive submodule updates
//! - Progress reporting from the transfer
//!
//! Authentication is delegated entirely to git's native system:
//! - SSH agent and keys from ~/.ssh/
//! - Git credential helpers
//! - Environment variables (GIT_SSH_COMMAND, etc.)

pub mod auth;
pub mod checkout;
pub mod clone;
pub mod error;
pub mod progress;
pub mod refs;
pub mod remote;
pub mod submodule;
pub mod url;

pub use checkout::open;
pub use clone::{clone_at, update_at};
pub use progress::ProgressWriter;
pub use refs::PinnedRef;
pub use submodule::{has_submodules, update_submodules};
