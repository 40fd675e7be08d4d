//! Error types and handling for vend
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Every variant belongs to one of four areas, reported by [`VendError::kind`]:
//! - [`ErrorKind::Config`]: malformed source declarations or config files
//! - [`ErrorKind::Fetch`]: clone, checkout and update failures
//! - [`ErrorKind::Link`]: link creation, including privilege escalation
//! - [`ErrorKind::Reconcile`]: stale entry removal under `vendored/`

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for vend operations
#[derive(Error, Diagnostic, Debug)]
pub enum VendError {
    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(vend::config::not_found),
        help("Create a vend.yaml in the project root or pass --project")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to read configuration file: {path}: {reason}")]
    #[diagnostic(code(vend::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(vend::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid source '{url}': {reason}")]
    #[diagnostic(
        code(vend::config::invalid_source),
        help("Each source needs a url and a reference_name such as refs/heads/main")
    )]
    InvalidSource { url: String, reason: String },

    #[error("Source declared more than once: {url}")]
    #[diagnostic(code(vend::config::duplicate_source))]
    DuplicateSource { url: String },

    #[error("Sources '{first}' and '{second}' would both be vendored as '{short_name}'")]
    #[diagnostic(
        code(vend::config::short_name_collision),
        help("Two sources cannot share the same final path segment; remove one of them")
    )]
    ShortNameCollision {
        short_name: String,
        first: String,
        second: String,
    },

    #[error("Could not determine the data directory")]
    #[diagnostic(
        code(vend::config::data_root_unavailable),
        help("Set VEND_DATA_DIR or XDG_DATA_HOME")
    )]
    DataRootUnavailable,

    // Fetch errors
    #[error("Failed to clone repository: {url}: {reason}")]
    #[diagnostic(
        code(vend::fetch::clone_failed),
        help("Check that URL is correct and you have access to repository")
    )]
    GitCloneFailed { url: String, reason: String },

    #[error("Failed to resolve git ref '{git_ref}': {reason}")]
    #[diagnostic(code(vend::fetch::ref_resolve_failed))]
    GitRefResolveFailed { git_ref: String, reason: String },

    #[error("Failed to checkout '{git_ref}': {reason}")]
    #[diagnostic(code(vend::fetch::checkout_failed))]
    GitCheckoutFailed { git_ref: String, reason: String },

    #[error("Failed to fetch from remote: {url}: {reason}")]
    #[diagnostic(code(vend::fetch::fetch_failed))]
    GitFetchFailed { url: String, reason: String },

    #[error("Failed to open repository at '{path}': {reason}")]
    #[diagnostic(code(vend::fetch::open_failed))]
    GitOpenFailed { path: String, reason: String },

    #[error("Failed to update submodule '{name}': {reason}")]
    #[diagnostic(code(vend::fetch::submodule_failed))]
    SubmoduleFailed { name: String, reason: String },

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(vend::fetch::operation_failed))]
    GitOperationFailed { message: String },

    // Link errors
    #[error("Invalid link {old} -> {new}: {reason}")]
    #[diagnostic(code(vend::link::invalid))]
    InvalidLink {
        old: String,
        new: String,
        reason: String,
    },

    #[error("Failed to link {new} -> {old}: {reason}")]
    #[diagnostic(
        code(vend::link::failed),
        help("On Windows, creating links requires Developer Mode or administrator rights")
    )]
    LinkFailed {
        old: String,
        new: String,
        reason: String,
    },

    #[error("Failed to run elevated link helper: {reason}")]
    #[diagnostic(code(vend::link::elevation_failed))]
    ElevationFailed { reason: String },

    #[error("Invalid link payload: {reason}")]
    #[diagnostic(code(vend::link::invalid_payload))]
    LinkPayloadInvalid { reason: String },

    // Reconcile errors
    #[error("Failed to remove stale entry '{path}': {reason}")]
    #[diagnostic(code(vend::reconcile::remove_failed))]
    ReconcileFailed { path: String, reason: String },

    // Run-level errors
    #[error("{failed} of {total} sources failed to sync")]
    #[diagnostic(
        code(vend::sync::failed),
        help("Run with --verbose for details on each failure")
    )]
    SyncFailed { failed: usize, total: usize },

    #[error("IO error: {message}")]
    #[diagnostic(code(vend::fs::io_error))]
    IoError { message: String },
}

/// The four error areas of a sync run, plus plain IO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Fetch,
    Link,
    Reconcile,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Link => "link",
            ErrorKind::Reconcile => "reconcile",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

impl VendError {
    /// Classify this error into its area
    pub fn kind(&self) -> ErrorKind {
        match self {
            VendError::ConfigNotFound { .. }
            | VendError::ConfigReadFailed { .. }
            | VendError::ConfigParseFailed { .. }
            | VendError::InvalidSource { .. }
            | VendError::DuplicateSource { .. }
            | VendError::ShortNameCollision { .. }
            | VendError::DataRootUnavailable => ErrorKind::Config,

            VendError::GitCloneFailed { .. }
            | VendError::GitRefResolveFailed { .. }
            | VendError::GitCheckoutFailed { .. }
            | VendError::GitFetchFailed { .. }
            | VendError::GitOpenFailed { .. }
            | VendError::SubmoduleFailed { .. }
            | VendError::GitOperationFailed { .. }
            | VendError::SyncFailed { .. } => ErrorKind::Fetch,

            VendError::InvalidLink { .. }
            | VendError::LinkFailed { .. }
            | VendError::ElevationFailed { .. }
            | VendError::LinkPayloadInvalid { .. } => ErrorKind::Link,

            VendError::ReconcileFailed { .. } => ErrorKind::Reconcile,

            VendError::IoError { .. } => ErrorKind::Io,
        }
    }
}

impl From<std::io::Error> for VendError {
    fn from(err: std::io::Error) -> Self {
        VendError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for VendError {
    fn from(err: serde_yaml::Error) -> Self {
        VendError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for VendError {
    fn from(err: serde_json::Error) -> Self {
        VendError::LinkPayloadInvalid {
            reason: err.to_string(),
        }
    }
}

impl From<git2::Error> for VendError {
    fn from(err: git2::Error) -> Self {
        VendError::GitOperationFailed {
            message: err.message().to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, VendError>;
