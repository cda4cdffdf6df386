//! Integration tests for index and listing discovery against a fake archive.

mod support;

use qcfetch_core::archive::{ArchiveClient, ArchiveError, Category, fetch_index, list_remote};
use support::{base_url, index_page, listing_page, mount_page};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_index_discovers_sub_collections_and_count() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        index_page(
            &[
                "Compound_000000001_000025000.html",
                "Compound_000025001_000050000.html",
                "Compound_000000001_000025000.html",
            ],
            Some(3_982_751),
        ),
    )
    .await;

    let client = ArchiveClient::new(base_url(&server)).unwrap();
    let index = fetch_index(&client).await.unwrap();

    let ids: Vec<&str> = index.sub_collections.iter().map(|s| s.id()).collect();
    assert_eq!(ids, ["000000001_000025000", "000025001_000050000"]);
    assert_eq!(index.total_count, Some(3_982_751));
}

#[tokio::test]
async fn test_fetch_index_without_count_phrase() {
    let server = MockServer::start().await;
    mount_page(&server, "/", index_page(&["Compound_1_0.html"], None)).await;

    let client = ArchiveClient::new(base_url(&server)).unwrap();
    let index = fetch_index(&client).await.unwrap();

    assert_eq!(index.sub_collections.len(), 1);
    assert!(index.total_count.is_none());
}

#[tokio::test]
async fn test_fetch_index_http_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ArchiveClient::new(base_url(&server)).unwrap();
    let result = fetch_index(&client).await;

    assert!(matches!(
        result,
        Err(ArchiveError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_fetch_index_without_links_is_parse_error() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body>maintenance</body></html>").await;

    let client = ArchiveClient::new(base_url(&server)).unwrap();
    let result = fetch_index(&client).await;

    assert!(matches!(result, Err(ArchiveError::Parse { .. })));
}

#[tokio::test]
async fn test_list_remote_partitions_by_category() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        index_page(&["Compound_000000001_000025000.html"], None),
    )
    .await;
    mount_page(
        &server,
        "/Compound_000000001_000025000.html",
        listing_page(
            "Compound_000000001_000025000",
            &[
                "1.b3lyp_6-31g(d).log.xz",
                "1.td.b3lyp_6-31g(d).log.xz",
                "1.mol",
                "2.b3lyp_6-31g(d).log.xz",
                "2.mol",
                "README.txt",
            ],
        ),
    )
    .await;

    let client = ArchiveClient::new(base_url(&server)).unwrap();
    let index = fetch_index(&client).await.unwrap();
    let listing = list_remote(&client, &index.sub_collections[0], &Category::ALL)
        .await
        .unwrap();

    let names = |category: Category| -> Vec<String> {
        listing[&category]
            .iter()
            .filter_map(|r| r.local_filename())
            .collect()
    };
    assert_eq!(
        names(Category::PrimaryLog),
        ["1.b3lyp_6-31g(d).log.xz", "2.b3lyp_6-31g(d).log.xz"]
    );
    assert_eq!(
        names(Category::TimeDependentLog),
        ["1.td.b3lyp_6-31g(d).log.xz"]
    );
    assert_eq!(names(Category::StructureFile), ["1.mol", "2.mol"]);
}

#[tokio::test]
async fn test_list_remote_only_requested_categories() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/Compound_1_0.html",
        listing_page("Compound_1_0", &["1.b3lyp_6-31g(d).log.xz", "1.mol"]),
    )
    .await;

    let client = ArchiveClient::new(base_url(&server)).unwrap();
    let sub = qcfetch_core::SubCollection::from_page("Compound_1_0.html").unwrap();
    let listing = list_remote(&client, &sub, &[Category::StructureFile])
        .await
        .unwrap();

    assert_eq!(listing.len(), 1);
    assert_eq!(listing[&Category::StructureFile].len(), 1);
}
