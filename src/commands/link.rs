//! Link command implementation
//!
//! Entry point of the elevated helper: the parent process encodes its pending
//! links and re-runs this binary as `vend link <payload>` with elevated
//! rights. Stops at the first link that cannot be created.

use crate::cli::LinkArgs;
use crate::error::Result;
use crate::link::{self, payload};

/// Run link command
pub fn run(args: &LinkArgs) -> Result<()> {
    let batch = payload::decode(&args.payload)?;
    let created = link::link_all(&batch)?;
    log::info!("Created {created} link(s)");
    Ok(())
}
