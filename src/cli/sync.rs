use clap::Parser;

/// Arguments for the sync command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Sync the project in the current directory:\n    vend sync\n\n\
                  Skip submodules:\n    vend sync --no-submodules\n\n\
                  Use verbose output:\n    vend sync -v")]
pub struct SyncArgs {
    /// Do not initialize or update submodules
    #[arg(long)]
    pub no_submodules: bool,
}
