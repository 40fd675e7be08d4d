//! Test fixtures shared by unit tests.
//!
//! Fetch tests need real upstream repositories. These helpers build them on
//! disk and hand out `file://` URLs, so no test touches the network.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{commit_file, create_upstream, file_url};
//!
//! #[test]
//! fn my_test() {
//!     let (temp, repo) = create_upstream();
//!     commit_file(&repo, "README.md", "hello");
//!     let url = file_url(repo.workdir().unwrap());
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// Initialize a repository whose initial branch is `main`.
///
/// # Panics
///
/// Panics if the repository cannot be created.
pub fn init_upstream(path: &Path) -> Repository {
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    Repository::init_opts(path, &options).expect("Failed to init upstream repository")
}

/// Create a temp directory holding an upstream repository at `upstream/`.
///
/// # Panics
///
/// Panics if the temp directory or repository cannot be created.
#[must_use]
pub fn create_upstream() -> (TempDir, Repository) {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let repo = init_upstream(&temp.path().join("upstream"));
    (temp, repo)
}

fn commit_index(repo: &Repository, message: &str) -> Oid {
    let mut index = repo.index().expect("Failed to open index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");

    let sig = Signature::now("Test", "test@example.com").expect("Failed to create signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit")
}

/// Write `name` with `content` and commit it on the current branch.
///
/// # Panics
///
/// Panics on any git or filesystem failure.
pub fn commit_file(repo: &Repository, name: &str, content: &str) -> Oid {
    let workdir = repo.workdir().expect("Upstream must have a working tree");
    fs::write(workdir.join(name), content).expect("Failed to write file");

    let mut index = repo.index().expect("Failed to open index");
    index.add_path(Path::new(name)).expect("Failed to stage file");
    index.write().expect("Failed to write index");

    commit_index(repo, name)
}

/// Register `url` as a submodule at `path` and commit `.gitmodules` with it.
///
/// # Panics
///
/// Panics if the submodule cannot be cloned or committed.
pub fn add_submodule(repo: &Repository, url: &str, path: &str) -> Oid {
    let mut submodule = repo
        .submodule(url, Path::new(path), true)
        .expect("Failed to set up submodule");
    submodule.clone(None).expect("Failed to clone submodule");
    submodule.add_finalize().expect("Failed to stage submodule");

    commit_index(repo, &format!("Add submodule {path}"))
}

/// Tag `target` with a lightweight tag.
///
/// # Panics
///
/// Panics if the tag cannot be created.
pub fn tag(repo: &Repository, name: &str, target: Oid) {
    let object = repo.find_object(target, None).expect("Failed to find object");
    repo.tag_lightweight(name, &object, false)
        .expect("Failed to create tag");
}

/// `file://` URL of a local path, without a trailing slash.
///
/// # Panics
///
/// Panics if `path` is not absolute.
pub fn file_url(path: &Path) -> String {
    let path: PathBuf = path.components().collect();
    url::Url::from_file_path(path)
        .expect("Path must be absolute")
        .to_string()
}
