//! End-to-end sync tests against local upstream repositories

mod common;

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use vend::config::Config;
use vend::engine::SyncReport;
use vend::error::VendError;
use vend::fetch::{Completion, FetchState};
use vend::link::{self, Escalator, LinkMode, LinkPublisher, LinkRequest, LinkStatus};
use vend::{Registry, Source};

use common::TestWorkspace;

fn registry(workspace: &TestWorkspace) -> Registry {
    Config::load(&workspace.project.join("vend.yaml"))
        .and_then(|config| config.registry())
        .expect("Failed to load registry")
}

async fn sync(workspace: &TestWorkspace) -> SyncReport {
    workspace
        .engine()
        .sync_until(&registry(workspace), std::future::pending())
        .await
        .expect("Sync failed")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_sync_clones_and_links() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    workspace.create_git_repo("b");
    let (url_a, url_b) = (workspace.url("a"), workspace.url("b"));
    workspace.write_config(&[(&url_a, "refs/heads/main"), (&url_b, "refs/heads/main")]);

    let report = sync(&workspace).await;

    assert!(!report.has_failures());
    assert_eq!(report.cloned(), 2);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.state == FetchState::Done(Completion::Success)));
    assert_eq!(workspace.vendored_names(), vec!["a", "b"]);
    assert!(workspace.vendored("a").join("README.md").is_file());

    let cache = Source::new(url_a, "refs/heads/main").dest_path(&workspace.data_root);
    assert!(cache.join(".git").is_dir());
    #[cfg(unix)]
    assert_eq!(fs::read_link(workspace.vendored("a")).unwrap(), cache);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_sync_updates_in_place() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    let url = workspace.url("a");
    workspace.write_config(&[(&url, "refs/heads/main")]);

    sync(&workspace).await;
    workspace.add_commit("a", "NEW.md", "second");

    let report = sync(&workspace).await;
    assert!(!report.has_failures());
    assert_eq!(report.cloned(), 0);
    assert_eq!(report.outcomes[0].link, Some(LinkStatus::Unchanged));
    assert!(report.outcomes[0].warnings.is_empty());
    assert_eq!(
        fs::read_to_string(workspace.vendored("a").join("NEW.md")).unwrap(),
        "second"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_removed_source_is_unlinked_but_cached() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    workspace.create_git_repo("b");
    let (url_a, url_b) = (workspace.url("a"), workspace.url("b"));
    workspace.write_config(&[(&url_a, "refs/heads/main"), (&url_b, "refs/heads/main")]);
    sync(&workspace).await;

    workspace.write_config(&[(&url_a, "refs/heads/main")]);
    let report = sync(&workspace).await;

    assert_eq!(workspace.vendored_names(), vec!["a"]);
    assert_eq!(report.reconcile.removed, vec![workspace.vendored("b")]);
    let cache_b = Source::new(url_b, "refs/heads/main").dest_path(&workspace.data_root);
    assert!(cache_b.join("README.md").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stale_entries_are_removed() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    let url = workspace.url("a");
    workspace.write_config(&[(&url, "refs/heads/main")]);

    let vendored = workspace.project.join("vendored");
    fs::create_dir_all(vendored.join("old-lib/src")).unwrap();
    fs::write(vendored.join("notes.txt"), "stray").unwrap();
    // An entry already named like a declared source is replaced by the link
    fs::create_dir_all(vendored.join("a")).unwrap();
    fs::write(vendored.join("a/local.txt"), "mine").unwrap();

    let report = sync(&workspace).await;

    assert!(!report.has_failures());
    assert!(report.reconcile.failures.is_empty());
    assert_eq!(report.reconcile.removed.len(), 2);
    assert_eq!(workspace.vendored_names(), vec!["a"]);
    assert!(workspace.vendored("a").join("README.md").is_file());
    assert!(!workspace.vendored("a").join("local.txt").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_registry_empties_vendored() {
    let workspace = TestWorkspace::new();
    fs::create_dir_all(workspace.vendored("leftover")).unwrap();
    workspace.write_config(&[]);

    let report = sync(&workspace).await;

    assert!(report.outcomes.is_empty());
    assert!(workspace.vendored_names().is_empty());
}

#[test]
fn test_short_name_collision_is_rejected() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("x/lib");
    workspace.create_git_repo("y/lib");
    let (url_x, url_y) = (workspace.url("x/lib"), workspace.url("y/lib"));
    workspace.write_config(&[(&url_x, "refs/heads/main"), (&url_y, "refs/heads/main")]);

    let result = Config::load(&workspace.project.join("vend.yaml")).and_then(|c| c.registry());
    match result {
        Err(VendError::ShortNameCollision { short_name, .. }) => assert_eq!(short_name, "lib"),
        other => panic!("Expected a short name collision, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_source_does_not_stop_siblings() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("good");
    let good = workspace.url("good");
    let missing = url::Url::from_file_path(workspace.temp.path().join("nowhere/missing"))
        .unwrap()
        .to_string();
    workspace.write_config(&[(&missing, "refs/heads/main"), (&good, "refs/heads/main")]);

    let report = sync(&workspace).await;

    assert!(report.has_failures());
    let failed: Vec<_> = report.failed().map(|o| o.job.source.short_name()).collect();
    assert_eq!(failed, vec!["missing"]);
    assert_eq!(
        report.outcomes[0].state,
        FetchState::Done(Completion::Failure)
    );
    assert!(report.outcomes[0].error.is_some());
    assert!(!report.outcomes[0].job.cache_path.exists());
    assert!(!workspace.vendored("missing").exists());
    assert!(workspace.vendored("good").join("README.md").is_file());

    let diagnostics = report.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].starts_with(&missing), "{}", diagnostics[0]);
    assert!(diagnostics[0].contains("Failed to clone repository"));

    assert!(matches!(
        report.into_result(),
        Err(VendError::SyncFailed { failed: 1, total: 2 })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_remote_keeps_stale_cache() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    let url = workspace.url("a");
    workspace.write_config(&[(&url, "refs/heads/main")]);
    sync(&workspace).await;

    fs::remove_dir_all(workspace.upstream("a")).unwrap();
    let report = sync(&workspace).await;

    assert!(!report.has_failures());
    let warning = report.outcomes[0].warning().expect("Expected a stale warning");
    assert!(warning.starts_with("stale:"), "{warning}");
    assert_eq!(report.diagnostics(), vec![format!("{url}@refs/heads/main: {warning}")]);
    assert!(workspace.vendored("a").join("README.md").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_clean_sync_has_no_diagnostics() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    let url = workspace.url("a");
    workspace.write_config(&[(&url, "refs/heads/main")]);

    let report = sync(&workspace).await;
    assert!(report.diagnostics().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_submodules_are_vendored() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("child");
    workspace.create_git_repo("parent");
    let child_url = workspace.url("child");
    workspace.add_submodule("parent", &child_url, "deps/child");
    let url = workspace.url("parent");
    workspace.write_config(&[(&url, "refs/heads/main")]);

    let report = sync(&workspace).await;

    assert!(!report.has_failures());
    assert!(report.diagnostics().is_empty(), "{:?}", report.diagnostics());
    assert!(
        workspace
            .vendored("parent")
            .join("deps/child/README.md")
            .is_file()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tag_and_short_name_pins() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    workspace.tag("a", "v1.0");
    workspace.add_commit("a", "LATER.md", "after the tag");
    workspace.create_git_repo("b");
    workspace.tag("b", "v2");

    let (url_a, url_b) = (workspace.url("a"), workspace.url("b"));
    workspace.write_config(&[(&url_a, "refs/tags/v1.0"), (&url_b, "v2")]);

    let report = sync(&workspace).await;

    assert!(!report.has_failures(), "{:?}", report.outcomes);
    assert!(workspace.vendored("a").join("README.md").is_file());
    assert!(!workspace.vendored("a").join("LATER.md").exists());
    assert!(workspace.vendored("b").join("README.md").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_interrupt_still_links_everything() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    workspace.create_git_repo("b");
    let (url_a, url_b) = (workspace.url("a"), workspace.url("b"));
    workspace.write_config(&[(&url_a, "refs/heads/main"), (&url_b, "refs/heads/main")]);

    let report = workspace
        .engine()
        .sync_until(&registry(&workspace), async {})
        .await
        .unwrap();

    assert!(report.interrupted);
    assert!(!report.has_failures());
    assert!(workspace.vendored("a").join("README.md").is_file());
    assert!(workspace.vendored("b").join("README.md").is_file());
}

/// Links in-process and counts how often it was asked to
struct InProcess {
    calls: Arc<AtomicUsize>,
}

impl Escalator for InProcess {
    fn run_elevated(&self, batch: &[LinkRequest]) -> vend::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        link::link_all(batch).map(|_| ())
    }
}

struct Refusing;

impl Escalator for Refusing {
    fn run_elevated(&self, _batch: &[LinkRequest]) -> vend::Result<()> {
        Err(VendError::ElevationFailed {
            reason: "operation cancelled by the user".to_string(),
        })
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_elevated_links_are_batched() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    workspace.create_git_repo("b");
    let (url_a, url_b) = (workspace.url("a"), workspace.url("b"));
    workspace.write_config(&[(&url_a, "refs/heads/main"), (&url_b, "refs/heads/main")]);

    let calls = Arc::new(AtomicUsize::new(0));
    let escalator = InProcess {
        calls: Arc::clone(&calls),
    };
    let report = workspace
        .engine()
        .with_publisher(LinkPublisher::new(LinkMode::Elevated(Box::new(escalator))))
        .sync_until(&registry(&workspace), std::future::pending())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!report.has_failures());
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.link == Some(LinkStatus::Deferred)));
    assert!(workspace.vendored("a").join("README.md").is_file());
    assert!(workspace.vendored("b").join("README.md").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refused_elevation_fails_every_deferred_source() {
    let workspace = TestWorkspace::new();
    workspace.create_git_repo("a");
    let url = workspace.url("a");
    workspace.write_config(&[(&url, "refs/heads/main")]);

    let report = workspace
        .engine()
        .with_publisher(LinkPublisher::new(LinkMode::Elevated(Box::new(Refusing))))
        .sync_until(&registry(&workspace), std::future::pending())
        .await
        .unwrap();

    assert!(report.has_failures());
    let error = report.outcomes[0].error.as_deref().unwrap();
    assert!(error.contains("cancelled"), "{error}");
    // The cache entry is still usable on the next run
    assert!(report.outcomes[0].job.cache_path.join("README.md").is_file());
    assert!(!workspace.vendored("a").exists());
}
