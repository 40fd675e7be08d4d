//! Link publishing
//!
//! Every synced source is exposed as `vendored/<short_name>`, a symbolic link
//! to its cache entry. Where the platform lets this process create links, they
//! are created as soon as a source is ready. Otherwise requests are queued and
//! the whole batch is handed to an [`Escalator`] once all fetchers are done.
//!
//! ## Module Organization
//!
//! - `payload.rs`: base64url JSON wire format of a batch
//! - `elevate.rs`: escalation trait and the Windows `runas` implementation

pub mod elevate;
pub mod payload;

pub use elevate::Escalator;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VendError};

/// Request to make `new` resolve to `old`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    /// Existing path, the link target
    pub old: PathBuf,
    /// Path of the link to create
    pub new: PathBuf,
}

/// What happened to one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// A link was created or replaced
    Created,
    /// The correct link was already there, or both paths are equal
    Unchanged,
    /// Queued for the elevated batch
    Deferred,
}

impl LinkRequest {
    pub fn new(old: impl Into<PathBuf>, new: impl Into<PathBuf>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    fn invalid(&self, reason: &str) -> VendError {
        VendError::InvalidLink {
            old: self.old.display().to_string(),
            new: self.new.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn failed(&self, err: &io::Error) -> VendError {
        VendError::LinkFailed {
            old: self.old.display().to_string(),
            new: self.new.display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Reject empty paths and make both paths absolute
    pub fn absolute(self) -> Result<Self> {
        if self.old.as_os_str().is_empty() || self.new.as_os_str().is_empty() {
            return Err(self.invalid("path is empty"));
        }
        let old = std::path::absolute(&self.old).map_err(|e| self.failed(&e))?;
        let new = std::path::absolute(&self.new).map_err(|e| self.failed(&e))?;
        Ok(Self { old, new })
    }

    /// Whether `new` already is a link to `old`
    pub fn is_satisfied(&self) -> bool {
        fs::read_link(&self.new).is_ok_and(|target| target == self.old)
    }
}

/// Remove a symbolic link without following it
pub fn remove_link(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        // Directory symlinks on Windows are removed as directories
        Err(e) if cfg!(windows) => fs::remove_dir(path).map_err(|_| e),
        other => other,
    }
}

#[cfg(unix)]
fn symlink(old: &Path, new: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(old, new)
}

#[cfg(windows)]
fn symlink(old: &Path, new: &Path) -> io::Result<()> {
    if old.is_dir() {
        std::os::windows::fs::symlink_dir(old, new)
    } else {
        std::os::windows::fs::symlink_file(old, new)
    }
}

fn clear(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.file_type().is_symlink() {
        remove_link(path)
    } else if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Create one link in this process
///
/// An existing correct link is left alone; anything else at `new` is
/// replaced.
pub fn create_link(request: &LinkRequest) -> Result<LinkStatus> {
    let request = request.clone().absolute()?;
    if request.old == request.new {
        return Ok(LinkStatus::Unchanged);
    }
    if request.is_satisfied() {
        return Ok(LinkStatus::Unchanged);
    }

    if let Some(parent) = request.new.parent() {
        fs::create_dir_all(parent).map_err(|e| request.failed(&e))?;
    }
    clear(&request.new).map_err(|e| request.failed(&e))?;
    symlink(&request.old, &request.new).map_err(|e| request.failed(&e))?;

    log::debug!(
        "Linked {} -> {}",
        request.new.display(),
        request.old.display()
    );
    Ok(LinkStatus::Created)
}

/// Create every link of a batch, stopping at the first failure
///
/// Returns the number of requests processed.
pub fn link_all(batch: &[LinkRequest]) -> Result<usize> {
    for request in batch {
        create_link(request)?;
    }
    Ok(batch.len())
}

/// How links are created
pub enum LinkMode {
    /// In this process, one request at a time
    Direct,
    /// Queued and handed to the escalator on [`LinkPublisher::flush`]
    Elevated(Box<dyn Escalator>),
}

/// Turns (cache path, link path) pairs into links
pub struct LinkPublisher {
    mode: LinkMode,
    pending: Mutex<Vec<LinkRequest>>,
}

impl LinkPublisher {
    pub fn new(mode: LinkMode) -> Self {
        Self {
            mode,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Publisher for the running platform and process rights
    pub fn for_platform() -> Self {
        let mode = if elevate::needs_elevation() {
            elevate::platform_escalator().map_or(LinkMode::Direct, LinkMode::Elevated)
        } else {
            LinkMode::Direct
        };
        Self::new(mode)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.mode, LinkMode::Elevated(_))
    }

    /// Link now, or queue for the elevated batch
    pub fn submit(&self, request: LinkRequest) -> Result<LinkStatus> {
        let request = request.absolute()?;
        if request.old == request.new || request.is_satisfied() {
            return Ok(LinkStatus::Unchanged);
        }

        match &self.mode {
            LinkMode::Direct => create_link(&request),
            LinkMode::Elevated(_) => {
                self.pending.lock().push(request);
                Ok(LinkStatus::Deferred)
            }
        }
    }

    /// Hand all queued requests to the escalator in one batch
    ///
    /// Returns the number of requests handed over.
    pub fn flush(&self) -> Result<usize> {
        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.is_empty() {
            return Ok(0);
        }

        match &self.mode {
            LinkMode::Elevated(escalator) => escalator.run_elevated(&batch)?,
            LinkMode::Direct => {
                link_all(&batch)?;
            }
        }
        Ok(batch.len())
    }

    /// Check that a deferred request was carried out
    pub fn verify(request: &LinkRequest) -> Result<()> {
        let request = request.clone().absolute()?;
        if request.old == request.new || request.is_satisfied() {
            Ok(())
        } else {
            Err(request.invalid("link was not created by the elevated helper"))
        }
    }
}
