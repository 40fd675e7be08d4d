//! vend - vendored git sources
//!
//! Keeps a project-local `vendored/` directory in sync with a declared list of
//! git sources, each pinned to a reference. Every source is cloned once into a
//! per-user cache and exposed as `vendored/<short name>`, a link to its cache
//! entry. Anything under `vendored/` that is no longer declared is removed.
//!
//! ```no_run
//! # async fn example() -> vend::error::Result<()> {
//! use vend::config::Config;
//! use vend::engine::Engine;
//!
//! let config = Config::discover(&std::env::current_dir()?)?;
//! let engine = Engine::new(vend::cache::data_root()?, config.project_root());
//! let report = engine.sync(&config.registry()?).await?;
//! println!("{} source(s) synced", report.outcomes.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fetch;
pub mod git;
pub mod link;
pub mod reconcile;
pub mod source;
pub mod ui;

#[cfg(test)]
mod test_fixtures;

pub use engine::{Engine, SyncOptions, SyncReport};
pub use error::{Result, VendError};
pub use source::{Registry, Source};
