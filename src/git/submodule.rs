//! Recursive submodule initialization and update

use git2::{Repository, SubmoduleUpdateOptions};

use super::error::interpret_git_error;
use super::progress::ProgressWriter;
use super::remote::fetch_options;
use crate::error::{Result, VendError};

/// Whether the checked-out tree declares submodules
pub fn has_submodules(repo: &Repository) -> bool {
    repo.workdir()
        .is_some_and(|workdir| workdir.join(".gitmodules").is_file())
}

/// Initialize and update every submodule, recursively
///
/// Returns the number of submodules updated, nested ones included.
pub fn update_submodules(repo: &Repository, writer: &ProgressWriter) -> Result<usize> {
    let submodules = repo
        .submodules()
        .map_err(|e| VendError::SubmoduleFailed {
            name: "<all>".to_string(),
            reason: interpret_git_error(&e),
        })?;

    let mut updated = 0;
    for mut submodule in submodules {
        let name = submodule.name().unwrap_or("<unnamed>").to_string();
        let submodule_failed = |e: &git2::Error| VendError::SubmoduleFailed {
            name: name.clone(),
            reason: interpret_git_error(e),
        };
        writer.submodule(format!("Updating submodule {name}"));

        let mut options = SubmoduleUpdateOptions::new();
        options.fetch(fetch_options(writer, false));
        submodule
            .update(true, Some(&mut options))
            .map_err(|e| submodule_failed(&e))?;

        let nested = submodule.open().map_err(|e| submodule_failed(&e))?;
        if has_submodules(&nested) {
            updated += update_submodules(&nested, writer)?;
        }
        updated += 1;
    }

    Ok(updated)
}
