//! Pinned reference handling
//!
//! This module handles:
//! - Classifying a declared reference (branch, tag, other ref, commit, short name)
//! - Mapping it to the refspecs fetched from the remote
//! - Resolving it against the refs already present in a local checkout

use git2::{Commit, Oid, Repository};

use crate::error::{Result, VendError};

/// Declared reference of a source, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinnedRef {
    /// `refs/heads/<name>`
    Branch(String),
    /// `refs/tags/<name>`
    Tag(String),
    /// Any other full ref, e.g. `refs/pull/1/head`
    Other(String),
    /// 40-hex commit id
    Commit(Oid),
    /// A bare name, tried as a branch and then as a tag
    Short(String),
}

/// One remote ref and where it is stored locally after a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefMapping {
    /// Ref name on the remote
    pub remote: String,
    /// Ref name written in the local checkout
    pub local: String,
    /// Local branch to check out, `None` for a detached HEAD
    pub branch: Option<String>,
}

impl RefMapping {
    fn branch(name: &str) -> Self {
        Self {
            remote: format!("refs/heads/{name}"),
            local: format!("refs/remotes/origin/{name}"),
            branch: Some(name.to_string()),
        }
    }

    fn detached(refname: String) -> Self {
        Self {
            remote: refname.clone(),
            local: refname,
            branch: None,
        }
    }

    /// Forced refspec fetching this mapping
    pub fn refspec(&self) -> String {
        format!("+{}:{}", self.remote, self.local)
    }
}

impl PinnedRef {
    /// Classify a declared reference name
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();

        if let Some(branch) = reference.strip_prefix("refs/heads/") {
            PinnedRef::Branch(branch.to_string())
        } else if let Some(tag) = reference.strip_prefix("refs/tags/") {
            PinnedRef::Tag(tag.to_string())
        } else if reference.starts_with("refs/") {
            PinnedRef::Other(reference.to_string())
        } else if reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit()) {
            Oid::from_str(reference)
                .map(PinnedRef::Commit)
                .unwrap_or_else(|_| PinnedRef::Short(reference.to_string()))
        } else {
            PinnedRef::Short(reference.to_string())
        }
    }

    /// Candidate mappings, in the order they are tried
    ///
    /// Commits have none: they are fetched by id.
    pub fn mappings(&self) -> Vec<RefMapping> {
        match self {
            PinnedRef::Branch(name) => vec![RefMapping::branch(name)],
            PinnedRef::Tag(name) => vec![RefMapping::detached(format!("refs/tags/{name}"))],
            PinnedRef::Other(refname) => vec![RefMapping::detached(refname.clone())],
            PinnedRef::Commit(_) => Vec::new(),
            PinnedRef::Short(name) => vec![
                RefMapping::branch(name),
                RefMapping::detached(format!("refs/tags/{name}")),
            ],
        }
    }

    /// Resolve against the local checkout without touching the network
    pub fn resolve_local<'r>(
        &self,
        repo: &'r Repository,
    ) -> Result<(Option<RefMapping>, Commit<'r>)> {
        if let PinnedRef::Commit(oid) = self {
            let commit = repo
                .find_commit(*oid)
                .map_err(|e| VendError::GitRefResolveFailed {
                    git_ref: oid.to_string(),
                    reason: e.message().to_string(),
                })?;
            return Ok((None, commit));
        }

        for mapping in self.mappings() {
            let commit = repo
                .find_reference(&mapping.local)
                .and_then(|reference| reference.peel_to_commit());
            if let Ok(commit) = commit {
                return Ok((Some(mapping), commit));
            }
        }

        Err(VendError::GitRefResolveFailed {
            git_ref: self.to_string(),
            reason: "Reference not present in checkout".to_string(),
        })
    }
}

impl std::fmt::Display for PinnedRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinnedRef::Branch(name) => write!(f, "refs/heads/{name}"),
            PinnedRef::Tag(name) => write!(f, "refs/tags/{name}"),
            PinnedRef::Other(refname) => f.write_str(refname),
            PinnedRef::Commit(oid) => write!(f, "{oid}"),
            PinnedRef::Short(name) => f.write_str(name),
        }
    }
}
