//! Declared source handling
//!
//! A [`Source`] is one entry of the registry: a repository URL pinned to a git
//! reference. Two names are derived from it:
//! - `short_name`: leaf segment of the URL path without `.git`, used as the
//!   entry name under `vendored/`
//! - `name`: host, normalized path and reference, used as the cache key under
//!   the data root
//!
//! URL forms accepted:
//! - `https://example.com/org/repo.git`
//! - `ssh://git@example.com/org/repo.git`, `git@example.com:org/repo.git`
//! - `file:///srv/git/repo`, `/srv/git/repo`
//!
//! Path segments are percent-decoded. An scp-style URL has no host/path
//! split, so its cache key is `<short_name>/<reference>`.
//!
//! ## Module Organization
//!
//! - `registry.rs`: validated, ordered set of sources

pub mod registry;

pub use registry::Registry;

use std::borrow::Cow;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::{Result, VendError};

/// A declared external repository pinned to a reference
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Source {
    /// Repository URL (HTTPS, SSH or local)
    pub url: String,

    /// Pinned git reference: `refs/heads/main`, `refs/tags/v1.0`, a commit id or a short name
    pub reference_name: String,
}

impl Source {
    /// Create a new source
    pub fn new(url: impl Into<String>, reference_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reference_name: reference_name.into(),
        }
    }

    /// Name of the link-farm entry for this source
    ///
    /// Example: `https://example.com/org/a.git` -> `a`
    pub fn short_name(&self) -> String {
        match self.parsed_url() {
            Some(url) => decode_segment(&leaf_name(url.path())).into_owned(),
            None => leaf_name(self.url.trim()),
        }
    }

    /// Cache key of this source, relative to the data root
    ///
    /// Example: `https://example.com/a.git` at `refs/heads/main` ->
    /// `example.com/a/refs/heads/main`
    pub fn name(&self) -> PathBuf {
        let mut name = PathBuf::new();

        match self.parsed_url().filter(|url| url.path_segments().is_some()) {
            Some(url) => {
                if let Some(host) = url.host_str() {
                    let host = match url.port() {
                        Some(port) => format!("{host}_{port}"),
                        None => host.to_string(),
                    };
                    name.push(sanitize_segment(&host));
                }

                let segments: Vec<&str> = url
                    .path_segments()
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.is_empty() && *s != ".")
                    .collect();
                let last = segments.len().saturating_sub(1);
                for (i, segment) in segments.iter().enumerate() {
                    let segment = if i == last {
                        segment.strip_suffix(".git").unwrap_or(segment)
                    } else {
                        segment
                    };
                    if !segment.is_empty() {
                        name.push(sanitize_segment(&decode_segment(segment)));
                    }
                }
            }
            None => name.push(self.short_name()),
        }

        for segment in path_segments(&self.reference_name) {
            name.push(sanitize_segment(segment));
        }

        name
    }

    /// Location of this source's cache entry
    pub fn dest_path(&self, data_root: &Path) -> PathBuf {
        data_root.join(self.name())
    }

    /// Check that both derived names are usable as paths
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| VendError::InvalidSource {
            url: self.url.clone(),
            reason: reason.to_string(),
        };

        if self.url.trim().is_empty() {
            return Err(invalid("url is empty"));
        }
        if self.reference_name.trim().is_empty() {
            return Err(invalid("reference_name is empty"));
        }

        let short_name = self.short_name();
        if short_name.is_empty()
            || short_name == "."
            || short_name == ".."
            || short_name.contains(['/', '\\'])
        {
            return Err(invalid("cannot derive a vendored name from the url"));
        }

        let escapes = self
            .name()
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(invalid("url or reference escapes the data directory"));
        }

        Ok(())
    }

    fn parsed_url(&self) -> Option<Url> {
        let url = self.url.trim();
        if Path::new(url).is_absolute() {
            return Url::from_file_path(url).ok();
        }
        // scp-style `git@host:path` is not a URL and stays unparsed
        Url::parse(url).ok()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.url, self.reference_name)
    }
}

fn leaf_name(path: &str) -> String {
    let leaf = path
        .rsplit(['/', '\\', ':'])
        .find(|s| !s.is_empty())
        .unwrap_or_default();
    leaf.strip_suffix(".git").unwrap_or(leaf).to_string()
}

/// Percent-decode one URL path segment; undecodable input is kept as-is
fn decode_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

fn path_segments(value: &str) -> impl Iterator<Item = &str> {
    value
        .trim()
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
}

// ':' is not allowed in Windows path segments (ports, drive letters, IPv6 hosts)
fn sanitize_segment(segment: &str) -> String {
    segment.replace(':', "_")
}
