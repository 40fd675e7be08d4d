//! vend - vendored git sources
//!
//! Keeps a project's `vendored/` directory in sync with the git sources
//! declared in its `vend.yaml`.

use clap::Parser;

use vend::cli::{Cli, Commands};
use vend::commands;
use vend::error::{ErrorKind, VendError};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "vend=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(verbose)
        .init();
}

/// Configuration problems exit with 2, everything else with 1
fn exit_code(err: &VendError) -> i32 {
    match err.kind() {
        ErrorKind::Config => 2,
        ErrorKind::Fetch | ErrorKind::Link | ErrorKind::Reconcile | ErrorKind::Io => 1,
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sync(args) => commands::sync::run(cli.project, &args),
        Commands::Link(args) => commands::link::run(&args),
        Commands::Version => commands::version::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(exit_code(&e));
    }
}
