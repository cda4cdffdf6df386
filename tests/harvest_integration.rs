//! End-to-end harvest tests against a fake archive.

mod support;

use std::fs;
use std::path::Path;
use std::time::Duration;

use qcfetch_core::{Category, HarvestConfig, HarvestError, Harvester};
use support::{PRIMARY_SUFFIX, base_url, index_page, listing_page, mount_file, mount_page};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Two sub-collections: `1_0` lists logs 1 and 2 plus a structure file,
/// `2_0` lists log 3.
async fn two_bucket_archive() -> MockServer {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        index_page(&["Compound_1_0.html", "Compound_2_0.html"], Some(3)),
    )
    .await;
    mount_page(
        &server,
        "/Compound_1_0.html",
        listing_page(
            "Compound_1_0",
            &[
                "1.b3lyp_6-31g(d).log.xz",
                "2.b3lyp_6-31g(d).log.xz",
                "1.mol",
            ],
        ),
    )
    .await;
    mount_page(
        &server,
        "/Compound_2_0.html",
        listing_page("Compound_2_0", &["3.b3lyp_6-31g(d).log.xz"]),
    )
    .await;
    for (route, body) in [
        ("/Compound_1_0/1.b3lyp_6-31g(d).log.xz", "log 1"),
        ("/Compound_1_0/2.b3lyp_6-31g(d).log.xz", "log 2"),
        ("/Compound_1_0/1.mol", "mol 1"),
        ("/Compound_2_0/3.b3lyp_6-31g(d).log.xz", "log 3"),
    ] {
        mount_file(&server, route, body.as_bytes()).await;
    }
    server
}

fn config(server: &MockServer, target: &Path, categories: &[Category]) -> HarvestConfig {
    HarvestConfig::new(target, categories.iter().copied())
        .unwrap()
        .with_base_url(base_url(server))
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
}

fn place(target: &Path, bucket: &str, category: Category, name: &str, body: &str) {
    let dir = target.join(bucket).join(category.dir_name());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), body).unwrap();
}

#[tokio::test]
async fn test_plan_lists_only_missing_primary_log() {
    let server = two_bucket_archive().await;
    let temp = TempDir::new().unwrap();
    place(temp.path(), "1_0", Category::PrimaryLog, &format!("1{PRIMARY_SUFFIX}"), "old");
    place(temp.path(), "2_0", Category::PrimaryLog, &format!("3{PRIMARY_SUFFIX}"), "old");

    let harvester = Harvester::new(config(&server, temp.path(), &[Category::PrimaryLog]));
    let items = harvester.plan().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].destination,
        temp.path()
            .join("1_0")
            .join("primary-log")
            .join(format!("2{PRIMARY_SUFFIX}"))
    );
    assert_eq!(items[0].url.path(), "/Compound_1_0/2.b3lyp_6-31g(d).log.xz");
}

#[tokio::test]
async fn test_plan_with_everything_present_is_empty() {
    let server = two_bucket_archive().await;
    let temp = TempDir::new().unwrap();
    place(temp.path(), "1_0", Category::StructureFile, "1.mol", "old");

    let harvester = Harvester::new(config(&server, temp.path(), &[Category::StructureFile]));
    let items = harvester.plan().await.unwrap();

    assert!(items.is_empty());
    assert!(
        temp.path().join("2_0").join("structure-file").is_dir(),
        "category directories are created even when nothing is missing"
    );
}

#[tokio::test]
async fn test_run_downloads_missing_files_and_keeps_existing() {
    let server = two_bucket_archive().await;
    let temp = TempDir::new().unwrap();
    place(temp.path(), "1_0", Category::PrimaryLog, &format!("1{PRIMARY_SUFFIX}"), "old");

    let harvester = Harvester::new(config(
        &server,
        temp.path(),
        &[Category::PrimaryLog, Category::StructureFile],
    ));
    let mut ticks = 0;
    let summary = harvester.run(|_| ticks += 1).await.unwrap();

    assert!(ticks >= 2, "progress is reported on ticks and once at the end");
    assert_eq!(summary.announced_molecules, Some(3));
    assert_eq!(summary.sub_collections, 2);
    assert_eq!(summary.failed_sub_collections, 0);
    assert_eq!(summary.queued[&Category::PrimaryLog], 2);
    assert_eq!(summary.queued[&Category::StructureFile], 1);
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.retried, 0);

    let read = |bucket: &str, category: Category, name: &str| {
        fs::read_to_string(temp.path().join(bucket).join(category.dir_name()).join(name)).unwrap()
    };
    assert_eq!(read("1_0", Category::PrimaryLog, &format!("1{PRIMARY_SUFFIX}")), "old");
    assert_eq!(read("1_0", Category::PrimaryLog, &format!("2{PRIMARY_SUFFIX}")), "log 2");
    assert_eq!(read("2_0", Category::PrimaryLog, &format!("3{PRIMARY_SUFFIX}")), "log 3");
    assert_eq!(read("1_0", Category::StructureFile, "1.mol"), "mol 1");
}

#[tokio::test]
async fn test_second_run_downloads_nothing() {
    let server = two_bucket_archive().await;
    let temp = TempDir::new().unwrap();
    let harvester = Harvester::new(config(&server, temp.path(), &[Category::PrimaryLog]));

    let first = harvester.run(|_| {}).await.unwrap();
    let second = harvester.run(|_| {}).await.unwrap();

    assert_eq!(first.completed, 3);
    assert_eq!(second.completed, 0);
    assert_eq!(second.queued[&Category::PrimaryLog], 0);
}

#[tokio::test]
async fn test_failing_sub_collection_is_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        index_page(&["Compound_1_0.html", "Compound_2_0.html"], None),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/Compound_1_0.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/Compound_2_0.html",
        listing_page("Compound_2_0", &["3.mol"]),
    )
    .await;
    mount_file(&server, "/Compound_2_0/3.mol", b"mol 3").await;

    let temp = TempDir::new().unwrap();
    let harvester = Harvester::new(config(&server, temp.path(), &[Category::StructureFile]));
    let summary = harvester.run(|_| {}).await.unwrap();

    assert_eq!(summary.failed_sub_collections, 1);
    assert_eq!(summary.completed, 1);
    assert!(temp.path().join("2_0/structure-file/3.mol").is_file());
}

#[tokio::test]
async fn test_missing_remote_file_is_dropped_and_run_finishes() {
    let server = MockServer::start().await;
    mount_page(&server, "/", index_page(&["Compound_1_0.html"], None)).await;
    mount_page(
        &server,
        "/Compound_1_0.html",
        listing_page("Compound_1_0", &["1.mol", "2.mol"]),
    )
    .await;
    mount_file(&server, "/Compound_1_0/1.mol", b"mol 1").await;
    Mock::given(method("GET"))
        .and(path("/Compound_1_0/2.mol"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let harvester = Harvester::new(config(&server, temp.path(), &[Category::StructureFile]));
    let summary = tokio::time::timeout(Duration::from_secs(10), harvester.run(|_| {}))
        .await
        .expect("run must finish when a file is gone for good")
        .unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.retried, 0);
    assert_eq!(summary.skipped, 1);
    assert!(temp.path().join("1_0/structure-file/1.mol").is_file());
    assert!(!temp.path().join("1_0/structure-file/2.mol").exists());
}

#[tokio::test]
async fn test_unreadable_index_aborts_before_any_work() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let harvester = Harvester::new(config(&server, temp.path(), &[Category::PrimaryLog]));
    let result = harvester.run(|_| {}).await;

    assert!(matches!(result, Err(HarvestError::Index(_))));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}
