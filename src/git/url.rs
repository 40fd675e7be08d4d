//! URL normalization for git operations
//!
//! This module handles:
//! - Rewriting SCP-style SSH URLs (`git@host:path`) to `ssh://` form
//! - Rewriting `file://` URLs libgit2 cannot resolve on Unix
//! - Detecting local transports, which cannot be fetched shallowly

use std::borrow::Cow;
use std::path::Path;

/// Normalize SSH URLs from SCP-style (git@host:path) to ssh:// format.
///
/// libgit2 and the `url` crate both need the explicit ssh:// form.
pub fn normalize_ssh_url_for_clone(url: &str) -> Cow<'_, str> {
    if !url.starts_with("git@") {
        return Cow::Borrowed(url);
    }

    match url.split_once(':') {
        Some((host_part, path_part)) => {
            let path = path_part.strip_prefix('/').unwrap_or(path_part);
            Cow::Owned(format!("ssh://{host_part}/{path}"))
        }
        None => Cow::Borrowed(url),
    }
}

/// Normalize file:// URLs so libgit2 can resolve them on Unix.
pub fn normalize_file_url_for_clone(url: &str) -> Cow<'_, str> {
    let Some(after) = url.strip_prefix("file://") else {
        return Cow::Borrowed(url);
    };

    #[cfg(not(windows))]
    {
        if after.contains('\\') {
            let path = after.replace('\\', "/");
            let path = path.trim_start_matches('/');
            return Cow::Owned(format!("file:///{path}"));
        }
        if !after.is_empty() && !after.starts_with('/') {
            return Cow::Owned(format!("file:///{after}"));
        }
    }
    #[cfg(windows)]
    let _ = after;

    Cow::Borrowed(url)
}

/// URL handed to libgit2 for a declared source URL
pub fn remote_url(url: &str) -> String {
    let url = url.trim();
    let url = normalize_ssh_url_for_clone(url);
    normalize_file_url_for_clone(&url).into_owned()
}

/// Local transports (`file://` and plain paths) do not support shallow fetches
pub fn is_local_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("file://") || url.starts_with('/') || Path::new(url).is_absolute()
}
