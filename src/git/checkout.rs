//! Checkout operations for cached repositories
//!
//! This module handles:
//! - Moving HEAD and the working tree to a pinned reference
//! - Opening existing cache entries

use std::path::Path;

use git2::Repository;
use git2::build::CheckoutBuilder;

use super::refs::PinnedRef;
use crate::error::{Result, VendError};

/// Force-checkout the pinned reference from refs already present locally
///
/// Branch pins keep a local branch of the same name pointing at the fetched
/// tip; every other pin leaves HEAD detached.
pub fn checkout_pinned(repo: &Repository, pinned: &PinnedRef) -> Result<()> {
    let (mapping, commit) = pinned.resolve_local(repo)?;
    let checkout_failed = |e: git2::Error| VendError::GitCheckoutFailed {
        git_ref: pinned.to_string(),
        reason: e.message().to_string(),
    };

    match mapping.and_then(|m| m.branch) {
        Some(branch) => {
            let refname = format!("refs/heads/{branch}");
            repo.reference(&refname, commit.id(), true, "vend: checkout")
                .map_err(checkout_failed)?;
            repo.set_head(&refname).map_err(checkout_failed)?;
        }
        None => repo.set_head_detached(commit.id()).map_err(checkout_failed)?,
    }

    let mut checkout_builder = CheckoutBuilder::new();
    checkout_builder.force();
    repo.checkout_head(Some(&mut checkout_builder))
        .map_err(checkout_failed)?;

    log::debug!(
        "Checked out {} at {} in {}",
        pinned,
        commit.id(),
        repo.workdir().unwrap_or_else(|| repo.path()).display()
    );
    Ok(())
}

/// Open an existing repository
pub fn open(path: &Path) -> Result<Repository> {
    Repository::open(path).map_err(|e| VendError::GitOpenFailed {
        path: path.display().to_string(),
        reason: e.message().to_string(),
    })
}
