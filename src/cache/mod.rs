//! Source cache for vend
//!
//! Every declared source is checked out once per pinned reference under the
//! per-user data root, and shared by all projects of that user.
//!
//! ## Cache Structure
//!
//! ```text
//! <data root>/
//! └── <host>/
//!     └── <path>/
//!         └── <reference>/      e.g. example.com/a/refs/heads/main
//!             └── <checkout>
//! ```
//!
//! The data root is resolved once per process and handed to the engine:
//! - `VEND_DATA_DIR`, used as-is when set
//! - `$XDG_DATA_HOME/vend`
//! - the OS data directory + `vend` (`~/.local/share`, `~/Library/Application Support`,
//!   roaming `AppData`)
//! - `~/.vend` as a last resort
//!
//! Entries are never removed automatically when their source is no longer declared.

pub mod lock;

pub use lock::CacheLocks;

use std::path::{Path, PathBuf};

use crate::error::{Result, VendError};

/// Application directory name under the user's data directory
const APP_DIR: &str = "vend";

/// Resolve the data root from the process environment
pub fn data_root() -> Result<PathBuf> {
    data_root_from(|key| std::env::var(key).ok(), dirs::data_dir(), dirs::home_dir())
}

/// Resolve the data root from explicit inputs
pub fn data_root_from(
    env: impl Fn(&str) -> Option<String>,
    data_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(dir) = non_empty("VEND_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = non_empty("XDG_DATA_HOME") {
        return Ok(PathBuf::from(dir).join(APP_DIR));
    }
    if let Some(dir) = data_dir {
        return Ok(dir.join(APP_DIR));
    }
    if let Some(home) = home_dir {
        return Ok(home.join(format!(".{APP_DIR}")));
    }

    Err(VendError::DataRootUnavailable)
}

/// Check whether a usable cache entry exists at `path`
///
/// A directory that is not a git repository (for example the leftovers of an
/// interrupted clone) does not count.
pub fn is_cached(path: &Path) -> bool {
    path.is_dir() && git2::Repository::open(path).is_ok()
}
