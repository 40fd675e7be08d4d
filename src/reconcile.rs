//! Pruning of the `vendored/` link farm
//!
//! Entries are matched on their literal file name against the declared short
//! names. Link targets are never followed: a stale link is unlinked, its
//! cache entry stays.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, VendError};
use crate::link::remove_link;

/// Directory holding the link farm, relative to the project root
pub const VENDORED_DIR: &str = "vendored";

/// Outcome of one reconcile pass
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Entries that were removed
    pub removed: Vec<PathBuf>,
    /// Entries that could not be removed
    pub failures: Vec<VendError>,
}

fn remove_entry(path: &Path, file_type: fs::FileType) -> io::Result<()> {
    if file_type.is_symlink() {
        remove_link(path)
    } else if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else {
        log::warn!("Removing unexpected file {}", path.display());
        fs::remove_file(path)
    }
}

/// Remove every entry of `vendored` not named in `short_names`
///
/// The directory is created when missing. Only listing the directory can
/// fail the whole pass; a failure on one entry is recorded and the rest are
/// still processed.
pub fn reconcile(vendored: &Path, short_names: &HashSet<String>) -> Result<ReconcileReport> {
    fs::create_dir_all(vendored).map_err(|e| VendError::ReconcileFailed {
        path: vendored.display().to_string(),
        reason: e.to_string(),
    })?;

    let declared: HashSet<OsString> = short_names.iter().map(OsString::from).collect();
    let mut report = ReconcileReport::default();

    let entries = fs::read_dir(vendored).map_err(|e| VendError::ReconcileFailed {
        path: vendored.display().to_string(),
        reason: e.to_string(),
    })?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Failed to read entry in {}: {}", vendored.display(), e);
                report.failures.push(VendError::ReconcileFailed {
                    path: vendored.display().to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if declared.contains(&entry.file_name()) {
            continue;
        }

        let path = entry.path();
        let removed = entry
            .file_type()
            .and_then(|file_type| remove_entry(&path, file_type));
        match removed {
            Ok(()) => {
                log::debug!("Removed stale entry {}", path.display());
                report.removed.push(path);
            }
            Err(e) => {
                log::warn!("Failed to remove {}: {}", path.display(), e);
                report.failures.push(VendError::ReconcileFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
