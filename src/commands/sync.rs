//! Sync command implementation
//!
//! The sync process:
//! 1. Load vend.yaml (from --project or the nearest ancestor directory)
//! 2. Validate the declared sources
//! 3. Resolve the data root
//! 4. Run the engine and print a per-source summary

use std::path::PathBuf;

use console::style;

use crate::cache;
use crate::cli::SyncArgs;
use crate::config::{CONFIG_FILE_NAME, Config};
use crate::engine::{Engine, SyncOptions, SyncReport};
use crate::error::{Result, VendError};
use crate::ui::DisplayMode;

fn load_config(project: Option<PathBuf>) -> Result<Config> {
    match project {
        Some(dir) => Config::load(&dir.join(CONFIG_FILE_NAME)),
        None => {
            let cwd = std::env::current_dir().map_err(|e| VendError::IoError {
                message: format!("Cannot read current directory: {e}"),
            })?;
            Config::discover(&cwd)
        }
    }
}

fn print_summary(report: &SyncReport) {
    for path in &report.reconcile.removed {
        println!("Removed {}", path.display());
    }

    for outcome in &report.outcomes {
        let name = outcome.job.source.short_name();
        match (&outcome.error, outcome.warning()) {
            (Some(error), _) => println!("{} {name}: {error}", style("✗").red()),
            (None, Some(warning)) => println!("{} {name}: {warning}", style("!").yellow()),
            (None, None) if outcome.cloned => println!("{} {name} (cloned)", style("✓").green()),
            (None, None) => println!("{} {name}", style("✓").green()),
        }
    }

    let failed = report.failed().count();
    println!(
        "Synced {} of {} source(s), {} cloned",
        report.outcomes.len() - failed,
        report.outcomes.len(),
        report.cloned()
    );
}

/// Run sync command
pub fn run(project: Option<PathBuf>, args: &SyncArgs) -> Result<()> {
    let config = load_config(project)?;
    let registry = config.registry()?;
    let project_root = config.project_root().to_path_buf();

    if registry.is_empty() {
        println!("No sources declared in {}.", CONFIG_FILE_NAME);
    }

    let data_root = cache::data_root()?;
    log::debug!("Data root: {}", data_root.display());

    let engine = Engine::new(data_root, project_root).with_options(SyncOptions {
        recurse_submodules: !args.no_submodules,
        display: DisplayMode::Interactive,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| VendError::IoError {
            message: format!("Failed to start async runtime: {e}"),
        })?;
    let report = runtime.block_on(engine.sync(&registry))?;

    print_summary(&report);
    report.into_result().map(|_| ())
}
