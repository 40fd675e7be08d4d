//! Git error handling
//!
//! libgit2 messages are terse and transport specific. Clone and fetch failures
//! are reported per source in the live display, so they are reduced to a short
//! reason first.

use git2::{Error, ErrorClass};

/// Reason categories shown for remote failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    RepositoryNotFound,
    ReferenceNotFound,
    AuthenticationFailed,
    PermissionDenied,
    NetworkError,
    CertificateError,
    SslError,
}

impl Category {
    fn describe(self) -> &'static str {
        match self {
            Category::RepositoryNotFound => "Repository not found",
            Category::ReferenceNotFound => "Reference not found on remote",
            Category::AuthenticationFailed => "Authentication failed",
            Category::PermissionDenied => "Permission denied",
            Category::NetworkError => "Network error",
            Category::CertificateError => "Certificate error",
            Category::SslError => "SSL error",
        }
    }
}

fn categorize(message: &str, class: ErrorClass) -> Option<Category> {
    let has = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if has(&["couldn't find remote ref", "no matching remote head"]) {
        Some(Category::ReferenceNotFound)
    } else if has(&[
        "not found",
        "404",
        "too many redirects",
        "authentication replays",
    ]) {
        Some(Category::RepositoryNotFound)
    } else if has(&["authentication", "credentials"]) {
        Some(Category::AuthenticationFailed)
    } else if has(&["permission denied", "access denied"]) {
        Some(Category::PermissionDenied)
    } else if has(&["connection", "network", "timeout", "timed out"]) {
        Some(Category::NetworkError)
    } else if class == ErrorClass::Http && message.contains("certificate") {
        Some(Category::CertificateError)
    } else if class == ErrorClass::Http && message.contains("ssl") {
        Some(Category::SslError)
    } else {
        None
    }
}

/// Interpret a git2 error and provide a more user-friendly message
pub fn interpret_git_error(err: &Error) -> String {
    let message = err.message().to_lowercase();

    match categorize(&message, err.class()) {
        Some(category) => category.describe().to_string(),
        None => match err.class() {
            ErrorClass::Http => format!("HTTP error: {}", err.message()),
            ErrorClass::Ssh => format!("SSH error: {}", err.message()),
            _ => err.message().to_string(),
        },
    }
}
