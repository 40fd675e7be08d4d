//! Clone and update of cache entries

use std::fs;
use std::path::Path;

use git2::Repository;

use super::checkout::{checkout_pinned, open};
use super::progress::ProgressWriter;
use super::refs::PinnedRef;
use super::remote::fetch_pinned;
use super::url::remote_url;
use crate::error::{Result, VendError};

fn reason_of(err: VendError) -> String {
    match err {
        VendError::GitFetchFailed { reason, .. }
        | VendError::GitRefResolveFailed { reason, .. }
        | VendError::GitCheckoutFailed { reason, .. }
        | VendError::GitOpenFailed { reason, .. } => reason,
        other => other.to_string(),
    }
}

fn clone_into(
    url: &str,
    target: &Path,
    pinned: &PinnedRef,
    writer: &ProgressWriter,
) -> Result<Repository> {
    let repo = Repository::init(target)?;
    // Named remote for manual inspection of the cache entry
    repo.remote("origin", &remote_url(url))?;
    fetch_pinned(&repo, url, pinned, writer)?;
    checkout_pinned(&repo, pinned)?;
    Ok(repo)
}

/// Clone `url` at the pinned reference into `target`
///
/// Anything already at `target` is removed first. On failure the partially
/// written directory is removed too, so the next sync starts over.
pub fn clone_at(
    url: &str,
    target: &Path,
    pinned: &PinnedRef,
    writer: &ProgressWriter,
) -> Result<Repository> {
    if target.exists() {
        log::debug!("Removing unusable cache entry {}", target.display());
        fs::remove_dir_all(target).map_err(|e| VendError::GitCloneFailed {
            url: url.to_string(),
            reason: format!("Failed to clear {}: {}", target.display(), e),
        })?;
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| VendError::GitCloneFailed {
            url: url.to_string(),
            reason: format!("Failed to create {}: {}", parent.display(), e),
        })?;
    }

    clone_into(url, target, pinned, writer).map_err(|err| {
        if let Err(e) = fs::remove_dir_all(target) {
            log::debug!(
                "Failed to remove partial clone {}: {}",
                target.display(),
                e
            );
        }
        VendError::GitCloneFailed {
            url: url.to_string(),
            reason: reason_of(err),
        }
    })
}

/// Bring an existing cache entry to the latest commit of the pinned reference
///
/// The working tree is force-checked-out before and after the fetch, so local
/// modifications in the cache never survive a sync.
pub fn update_at(
    url: &str,
    target: &Path,
    pinned: &PinnedRef,
    writer: &ProgressWriter,
) -> Result<Repository> {
    let repo = open(target)?;
    checkout_pinned(&repo, pinned)?;
    fetch_pinned(&repo, url, pinned, writer)?;
    checkout_pinned(&repo, pinned)?;
    Ok(repo)
}
