//! Configuration file handling for vend
//!
//! `vend.yaml` declares the sources of a project. Only reading is supported;
//! the file is looked up in the starting directory and then in each ancestor.
//!
//! ```yaml
//! version: 1
//! sources:
//!   - url: https://github.com/org/lib.git
//!     reference_name: refs/heads/main
//! ```
//!
//! Keys this crate does not use (for example `scripts`) are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VendError};
use crate::source::{Registry, Source};

/// Config file name looked up in the project root
pub const CONFIG_FILE_NAME: &str = "vend.yaml";

/// Project configuration (vend.yaml)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Config format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Declared sources, in order
    #[serde(default)]
    pub sources: Vec<Source>,

    /// Path of the file this config was read from
    #[serde(skip)]
    pub location: PathBuf,
}

fn default_version() -> u32 {
    1
}

impl Config {
    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Read configuration from an explicit file path
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(VendError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| VendError::ConfigReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut config: Self =
            serde_yaml::from_str(&content).map_err(|e| VendError::ConfigParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.location = path.to_path_buf();

        log::debug!(
            "Loaded {} with {} sources",
            path.display(),
            config.sources.len()
        );
        Ok(config)
    }

    /// Find and read `vend.yaml` in `start` or its nearest ancestor
    pub fn discover(start: &Path) -> Result<Self> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
            dir = current.parent();
        }

        Err(VendError::ConfigNotFound {
            path: start.join(CONFIG_FILE_NAME).display().to_string(),
        })
    }

    /// Directory containing the config file
    pub fn project_root(&self) -> &Path {
        self.location.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Validated registry of the declared sources
    pub fn registry(&self) -> Result<Registry> {
        Registry::new(self.sources.clone())
    }
}
