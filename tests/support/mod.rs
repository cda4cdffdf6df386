//! Shared fixtures: a fake archive served by wiremock.
//!
//! Pages mimic the real site closely enough for the scrapers: a root index
//! linking `Compound_<a>_<b>.html` pages, and listing pages whose hrefs point
//! into `Compound_<a>_<b>/`.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

pub const PRIMARY_SUFFIX: &str = ".b3lyp_6-31g(d).log.xz";

/// Root index linking `pages`, optionally announcing a molecule count.
pub fn index_page(pages: &[&str], molecules: Option<u64>) -> String {
    let mut html = String::from("<html><body>\n");
    if let Some(count) = molecules {
        html.push_str(&format!(
            "<p>Currently {count} molecules are available on this site</p>\n"
        ));
    }
    for page in pages {
        html.push_str(&format!("<a href=\"{page}\">{page}</a><br>\n"));
    }
    html.push_str("</body></html>\n");
    html
}

/// Sub-collection listing linking `files` inside `dir`.
pub fn listing_page(dir: &str, files: &[&str]) -> String {
    let mut html = String::from("<html><body><a href=\"../\">Parent</a>\n");
    for file in files {
        html.push_str(&format!("<a href=\"{dir}/{file}\">{file}</a>\n"));
    }
    html.push_str("</body></html>\n");
    html
}

/// Archive base URL for `server`, with the trailing slash.
pub fn base_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

pub async fn mount_page(server: &MockServer, route: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.into()))
        .mount(server)
        .await;
}

pub async fn mount_file(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Fails the first `fail_count` requests with 500, then serves the body.
struct FlakyResponder {
    request_count: Arc<AtomicUsize>,
    fail_count: usize,
    success_body: Vec<u8>,
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self.request_count.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_count {
            ResponseTemplate::new(500).set_body_bytes(b"internal server error".to_vec())
        } else {
            ResponseTemplate::new(200).set_body_bytes(self.success_body.clone())
        }
    }
}

/// Mounts a file that fails `fail_count` times before succeeding.
///
/// Returns the request counter.
pub async fn mount_flaky_file(
    server: &MockServer,
    route: &str,
    fail_count: usize,
    success_body: &[u8],
) -> Arc<AtomicUsize> {
    let request_count = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(FlakyResponder {
            request_count: Arc::clone(&request_count),
            fail_count,
            success_body: success_body.to_vec(),
        })
        .mount(server)
        .await;
    request_count
}
