//! Fetching pinned references
//!
//! Only the pinned reference is fetched, never the whole remote. Remote URLs
//! are shallow-fetched at depth 1; local transports are fetched in full.

use git2::{AutotagOption, FetchOptions, Remote, RemoteCallbacks, Repository};

use super::auth::setup_auth_callbacks;
use super::error::interpret_git_error;
use super::progress::ProgressWriter;
use super::refs::PinnedRef;
use super::url::{is_local_url, remote_url};
use crate::error::{Result, VendError};

/// Local ref holding a commit fetched by id
const PINNED_COMMIT_REF: &str = "refs/vend/pinned";

/// Fetch options wired to authentication and progress reporting
pub fn fetch_options(writer: &ProgressWriter, shallow: bool) -> FetchOptions<'_> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);
    callbacks.sideband_progress(move |data| {
        writer.write(&String::from_utf8_lossy(data));
        true
    });
    callbacks.transfer_progress(move |stats| {
        let total = stats.total_objects();
        if total > 0 {
            #[allow(clippy::cast_precision_loss)]
            writer.fraction(stats.received_objects() as f64 / total as f64);
        }
        true
    });

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    fetch_options.download_tags(AutotagOption::None);
    if shallow {
        fetch_options.depth(1);
    }
    fetch_options
}

fn fetch_refspecs(
    remote: &mut Remote<'_>,
    refspecs: &[String],
    shallow: bool,
    writer: &ProgressWriter,
) -> std::result::Result<(), git2::Error> {
    let mut options = fetch_options(writer, shallow);
    remote.fetch(refspecs, Some(&mut options), Some("vend: fetch"))
}

/// Fetch the pinned reference of `url` into `repo`
pub fn fetch_pinned(
    repo: &Repository,
    url: &str,
    pinned: &PinnedRef,
    writer: &ProgressWriter,
) -> Result<()> {
    let fetch_failed = |e: &git2::Error| VendError::GitFetchFailed {
        url: url.to_string(),
        reason: interpret_git_error(e),
    };
    let shallow = !is_local_url(url);
    let mut remote = repo
        .remote_anonymous(&remote_url(url))
        .map_err(|e| fetch_failed(&e))?;

    if let PinnedRef::Commit(oid) = pinned {
        if repo.find_commit(*oid).is_ok() {
            return Ok(());
        }

        let by_id = vec![format!("+{oid}:{PINNED_COMMIT_REF}")];
        let fetched = fetch_refspecs(&mut remote, &by_id, shallow, writer).is_ok()
            && repo.find_commit(*oid).is_ok();
        if !fetched {
            // Some servers refuse unadvertised objects; fall back to all branches
            log::debug!("Fetching {oid} by id from {url} failed, fetching all branches");
            let all = vec!["+refs/heads/*:refs/remotes/origin/*".to_string()];
            fetch_refspecs(&mut remote, &all, false, writer).map_err(|e| fetch_failed(&e))?;
        }

        return repo
            .find_commit(*oid)
            .map(|_| ())
            .map_err(|_| VendError::GitRefResolveFailed {
                git_ref: oid.to_string(),
                reason: "Commit not found on remote".to_string(),
            });
    }

    let mut last_error = None;
    for mapping in pinned.mappings() {
        match fetch_refspecs(&mut remote, &[mapping.refspec()], shallow, writer) {
            Ok(()) if repo.find_reference(&mapping.local).is_ok() => return Ok(()),
            Ok(()) => {
                log::debug!("{} not advertised by {url}", mapping.remote);
            }
            Err(e) => {
                log::debug!("Fetching {} from {url} failed: {}", mapping.remote, e.message());
                last_error = Some(fetch_failed(&e));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| VendError::GitRefResolveFailed {
        git_ref: pinned.to_string(),
        reason: "Reference not found on remote".to_string(),
    }))
}
