//! Common test utilities for vend integration tests

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

use vend::engine::{Engine, SyncOptions};
use vend::link::{LinkMode, LinkPublisher};
use vend::ui::DisplayMode;

/// A project, a data root and upstream repositories in one temp directory
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Project root holding vend.yaml and vendored/
    pub project: PathBuf,
    /// Cache root handed to the engine
    pub data_root: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let project = temp.path().join("project");
        let data_root = temp.path().join("data");
        fs::create_dir_all(&project).expect("Failed to create project directory");
        Self {
            temp,
            project,
            data_root,
        }
    }

    /// Path of an upstream repository
    pub fn upstream(&self, name: &str) -> PathBuf {
        self.temp.path().join("upstream").join(name)
    }

    /// Create an upstream repository on branch `main` with one commit
    pub fn create_git_repo(&self, name: &str) -> PathBuf {
        let path = self.upstream(name);
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        Repository::init_opts(&path, &options).expect("Failed to init upstream repository");
        self.add_commit(name, "README.md", &format!("# {name}\n"));
        path
    }

    /// Commit a file to an upstream repository
    pub fn add_commit(&self, name: &str, file: &str, content: &str) -> Oid {
        let repo = Repository::open(self.upstream(name)).expect("Failed to open upstream");
        let workdir = repo.workdir().expect("Upstream must have a working tree");
        let file_path = workdir.join(file);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");

        let mut index = repo.index().expect("Failed to open index");
        index.add_path(Path::new(file)).expect("Failed to stage file");
        index.write().expect("Failed to write index");
        let tree = repo
            .find_tree(index.write_tree().expect("Failed to write tree"))
            .expect("Failed to find tree");

        let sig = Signature::now("Test", "test@example.com").expect("Failed to create signature");
        let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, file, &tree, &parents)
            .expect("Failed to commit")
    }

    /// Add `url` as a submodule at `path` of an upstream repository and commit it
    pub fn add_submodule(&self, name: &str, url: &str, path: &str) -> Oid {
        let repo = Repository::open(self.upstream(name)).expect("Failed to open upstream");
        let mut submodule = repo
            .submodule(url, Path::new(path), true)
            .expect("Failed to set up submodule");
        submodule.clone(None).expect("Failed to clone submodule");
        submodule.add_finalize().expect("Failed to stage submodule");

        let mut index = repo.index().expect("Failed to open index");
        let tree = repo
            .find_tree(index.write_tree().expect("Failed to write tree"))
            .expect("Failed to find tree");
        let sig = Signature::now("Test", "test@example.com").expect("Failed to create signature");
        let parent = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .expect("Upstream has no commits");
        repo.commit(Some("HEAD"), &sig, &sig, path, &tree, &[&parent])
            .expect("Failed to commit")
    }

    /// Tag the current HEAD of an upstream repository
    pub fn tag(&self, name: &str, tag: &str) {
        let repo = Repository::open(self.upstream(name)).expect("Failed to open upstream");
        let head = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .expect("Upstream has no commits");
        repo.tag_lightweight(tag, head.as_object(), false)
            .expect("Failed to create tag");
    }

    /// `file://` URL of an upstream repository
    pub fn url(&self, name: &str) -> String {
        url::Url::from_file_path(self.upstream(name))
            .expect("Upstream path must be absolute")
            .to_string()
    }

    /// Write vend.yaml declaring `(url, reference_name)` pairs
    pub fn write_config(&self, sources: &[(&str, &str)]) {
        let mut yaml = String::from("version: 1\nsources:\n");
        for (url, reference) in sources {
            yaml.push_str(&format!("  - url: {url}\n    reference_name: {reference}\n"));
        }
        if sources.is_empty() {
            yaml = String::from("version: 1\nsources: []\n");
        }
        fs::write(self.project.join("vend.yaml"), yaml).expect("Failed to write vend.yaml");
    }

    /// Path of an entry under vendored/
    pub fn vendored(&self, short_name: &str) -> PathBuf {
        self.project.join("vendored").join(short_name)
    }

    /// Names of all entries under vendored/
    pub fn vendored_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.project.join("vendored"))
            .expect("vendored/ must exist")
            .map(|entry| {
                entry
                    .expect("Failed to read entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Engine without a live display that links in-process
    pub fn engine(&self) -> Engine {
        Engine::new(&self.data_root, &self.project)
            .with_options(SyncOptions {
                recurse_submodules: true,
                display: DisplayMode::Hidden,
            })
            .with_publisher(LinkPublisher::new(LinkMode::Direct))
    }

    /// Command running the vend binary in the project directory
    pub fn vend_cmd(&self) -> assert_cmd::Command {
        #[allow(deprecated)]
        let mut cmd = assert_cmd::Command::cargo_bin("vend").expect("vend binary must be built");
        cmd.current_dir(&self.project)
            .env("VEND_DATA_DIR", &self.data_root)
            .env_remove("RUST_LOG");
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_creation() {
        let workspace = TestWorkspace::new();
        assert!(workspace.project.is_dir());
        assert!(!workspace.data_root.exists());
    }

    #[test]
    fn test_create_git_repo() {
        let workspace = TestWorkspace::new();
        let path = workspace.create_git_repo("a");
        assert!(path.join("README.md").is_file());
        assert!(workspace.url("a").starts_with("file://"));
    }
}
