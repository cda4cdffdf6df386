//! Root index page: sub-collection discovery.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument};
use url::Url;

use super::client::ArchiveClient;
use super::error::ArchiveError;

/// Sub-collection listing pages linked from the root index.
#[allow(clippy::expect_used)]
static SUB_COLLECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Compound_\d+_\d+\.html").expect("sub-collection regex is valid") // Static pattern, safe to panic
});

/// Bucket id embedded in a sub-collection page name.
#[allow(clippy::expect_used)]
static BUCKET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+_\d+").expect("bucket regex is valid") // Static pattern, safe to panic
});

/// Molecule count announced on the root page.
#[allow(clippy::expect_used)]
static TOTAL_COUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Currently\s+(\d+)\s+molecules are available on this site")
        .expect("total count regex is valid") // Static pattern, safe to panic
});

/// One remote directory-listing page grouping files of a numeric bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SubCollection {
    page: String,
    bucket: String,
}

impl SubCollection {
    /// Builds a sub-collection from its listing page name
    /// (e.g. `Compound_000000001_000025000.html`).
    ///
    /// Returns `None` when the name carries no `<digits>_<digits>` bucket.
    #[must_use]
    pub fn from_page(page: &str) -> Option<Self> {
        let bucket = BUCKET_PATTERN.find(page)?.as_str().to_string();
        Some(Self {
            page: page.to_string(),
            bucket,
        })
    }

    /// Listing page name, relative to the archive base URL.
    #[must_use]
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Bucket id used as the local directory name.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.bucket
    }
}

impl fmt::Display for SubCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bucket)
    }
}

/// Parsed root index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveIndex {
    /// Sub-collections in the order the index lists them.
    pub sub_collections: Vec<SubCollection>,
    /// Molecule count announced by the archive. Informational only.
    pub total_count: Option<u64>,
}

/// Parses the root index document.
///
/// Each page name is reported once, in first-seen order.
///
/// # Errors
///
/// Returns [`ArchiveError::Parse`] when the page links no sub-collection.
pub fn parse_index(url: &str, body: &str) -> Result<ArchiveIndex, ArchiveError> {
    let mut seen = HashSet::new();
    let sub_collections: Vec<SubCollection> = SUB_COLLECTION_PATTERN
        .find_iter(body)
        .map(|m| m.as_str())
        .filter(|page| seen.insert(*page))
        .filter_map(SubCollection::from_page)
        .collect();

    if sub_collections.is_empty() {
        return Err(ArchiveError::parse(url, "sub-collection links"));
    }

    let total_count = TOTAL_COUNT_PATTERN
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());

    debug!(
        sub_collections = sub_collections.len(),
        ?total_count,
        "parsed root index"
    );

    Ok(ArchiveIndex {
        sub_collections,
        total_count,
    })
}

/// Fetches and parses the root index page.
///
/// No retry happens here; the caller decides what a failure means.
///
/// # Errors
///
/// Returns a fetch-level [`ArchiveError`] if the request fails and
/// [`ArchiveError::Parse`] if the page lists no sub-collection.
#[instrument(skip(client), fields(base_url = %client.base_url()))]
pub async fn fetch_index(client: &ArchiveClient) -> Result<ArchiveIndex, ArchiveError> {
    let url: Url = client.base_url().clone();
    let body = client.fetch_text(&url).await?;
    let index = parse_index(url.as_str(), &body)?;
    info!(
        sub_collections = index.sub_collections.len(),
        molecules = index.total_count,
        "archive index loaded"
    );
    Ok(index)
}
