//! Full-run flow: fetch a listing from a mock endpoint, normalize both entry
//! shapes, reconcile orphans, and drain the sync queue.

mod common;

use std::sync::Arc;

use common::{context, init_upstream};
use orgmirror::listing::load_projects;
use orgmirror::{delete_orphans, find_orphans, Config, HttpListing, RunStatus, SyncScheduler};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn listing_to_synced_mirror() {
    let upstreams = TempDir::new().unwrap();
    let mirror = TempDir::new().unwrap();

    let widgets = init_upstream(upstreams.path(), "acme", "widgets");
    init_upstream(upstreams.path(), "acme", "gadgets");

    // one org/name entry resolved against git_base, one GitHub-style entry
    // carrying its own URL
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"full_name": "acme/gadgets"},
            {
                "full_name": "acme/widgets",
                "name": "widgets",
                "owner": {"login": "acme"},
                "html_url": widgets.display().to_string()
            }
        ])))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.mirror_root = mirror.path().display().to_string();
    config.listing.url = format!("{}/repos", server.uri());
    config.listing.git_base = upstreams.path().display().to_string();

    let source = HttpListing::new(config.listing.url.clone());
    let projects = load_projects(&source, &config).await.unwrap();
    assert_eq!(projects.len(), 2);

    // a stale directory that no listing entry covers
    std::fs::create_dir_all(mirror.path().join("acme/stale")).unwrap();

    let orphans = find_orphans(&projects, mirror.path()).unwrap();
    assert_eq!(orphans, vec![mirror.path().join("acme/stale")]);

    let ctx = context(mirror.path(), &[]);
    ctx.report.set_orphans(orphans.clone());

    let scheduler = SyncScheduler::new(4);
    let status = scheduler.run(projects.clone(), Arc::clone(&ctx)).await.unwrap();

    assert_eq!(status, RunStatus::Drained);
    assert!(mirror.path().join("acme/widgets/.git").is_dir());
    assert!(mirror.path().join("acme/gadgets/.git").is_dir());
    assert!(ctx.report.errored().is_empty());
    assert!(ctx.report.off_main().is_empty());
    assert_eq!(ctx.report.orphans(), orphans);

    // reconcile: delete the orphan set, a rescan comes back empty
    delete_orphans(&orphans).unwrap();
    assert!(find_orphans(&projects, mirror.path()).unwrap().is_empty());
    assert!(mirror.path().join("acme/widgets").exists());
}
