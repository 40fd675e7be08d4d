//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - sync: Sync command arguments
//! - link: Arguments of the hidden elevated link helper

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod link;
pub mod sync;

pub use link::LinkArgs;
pub use sync::SyncArgs;

/// vend - vendored git sources
///
/// Keep a project's vendored/ directory in sync with pinned git sources.
#[derive(Parser, Debug)]
#[command(
    name = "vend",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Keep a project's vendored directory in sync with pinned git sources",
    long_about = "vend clones every source declared in vend.yaml into a per-user cache, \
                  pinned to its reference, and links each one into the project's vendored/ \
                  directory. Anything in vendored/ that is no longer declared is removed.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  vend sync\n    \
                  vend sync --project ../other-project\n    \
                  vend sync --no-submodules -v\n\n\
                  \x1b[1m\x1b[32mEnvironment:\x1b[0m\n    \
                  VEND_DATA_DIR    cache root (default: <data dir>/vend)\n    \
                  RUST_LOG         log filter, e.g. vend=debug"
)]
pub struct Cli {
    /// Project directory containing vend.yaml (defaults to the nearest one upwards)
    #[arg(long, short = 'p', global = true)]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every declared source and rebuild vendored/
    #[command(visible_alias = "install")]
    Sync(SyncArgs),

    /// Create links from an encoded batch (used for privilege escalation)
    #[command(hide = true)]
    Link(LinkArgs),

    /// Show version information
    Version,
}
