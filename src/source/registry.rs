//! Validated, ordered set of declared sources
//!
//! Declaration order is kept: a source's position is its index for the whole
//! sync run.

use std::collections::HashMap;
use std::collections::HashSet;

use super::Source;
use crate::error::{Result, VendError};

/// Ordered set of sources with unique URLs and unique vendored names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    sources: Vec<Source>,
}

impl Registry {
    /// Validate and build a registry
    ///
    /// Fails on the first invalid source, duplicated URL, or pair of distinct
    /// URLs that would be vendored under the same name.
    pub fn new(sources: Vec<Source>) -> Result<Self> {
        let mut urls = HashSet::new();
        let mut short_names: HashMap<String, &str> = HashMap::new();

        for source in &sources {
            source.validate()?;

            if !urls.insert(source.url.trim()) {
                return Err(VendError::DuplicateSource {
                    url: source.url.clone(),
                });
            }

            let short_name = source.short_name();
            if let Some(first) = short_names.insert(collision_key(&short_name), &source.url) {
                return Err(VendError::ShortNameCollision {
                    short_name,
                    first: first.to_string(),
                    second: source.url.clone(),
                });
            }
        }

        Ok(Self { sources })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Names that may exist under `vendored/`
    pub fn short_names(&self) -> HashSet<String> {
        self.sources.iter().map(Source::short_name).collect()
    }
}

// Links live on the project's filesystem, which is case-insensitive by default
// on Windows and macOS.
#[cfg(any(windows, target_os = "macos"))]
fn collision_key(short_name: &str) -> String {
    short_name.to_lowercase()
}

#[cfg(not(any(windows, target_os = "macos")))]
fn collision_key(short_name: &str) -> String {
    short_name.to_string()
}
