//! Sub-collection listing pages: per-category file references.
//!
//! The scraping functions are pure and operate on the page body only, so
//! they can be exercised against literal HTML fixtures.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use super::category::Category;
use super::client::ArchiveClient;
use super::error::ArchiveError;
use super::index::SubCollection;

/// `href` values pointing into a sub-collection directory.
#[allow(clippy::expect_used)]
static HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(Compound[^"]*)""#).expect("href regex is valid") // Static pattern, safe to panic
});

/// Local filename carried by a ref: a numeric id, a dot, then the rest.
#[allow(clippy::expect_used)]
static LOCAL_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.").expect("local name regex is valid") // Static pattern, safe to panic
});

/// A remote file reference as it appears in a listing `href`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFileRef {
    href: String,
}

impl RemoteFileRef {
    /// Wraps a raw listing href.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }

    /// The href, relative to the archive base URL.
    #[must_use]
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Last path segment of the href, percent-decoded.
    #[must_use]
    pub fn file_segment(&self) -> String {
        let raw = self.href.rsplit('/').next().unwrap_or(&self.href);
        urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |decoded| decoded.into_owned())
    }

    /// Name the file gets on disk (`<numeric id>.<ext>`).
    ///
    /// `None` when the last segment does not start with a numeric id, or
    /// decodes to something that is not a single path component.
    #[must_use]
    pub fn local_filename(&self) -> Option<String> {
        let segment = self.file_segment();
        if segment.contains(['/', '\\']) || segment.contains("..") {
            return None;
        }
        LOCAL_NAME_PATTERN.is_match(&segment).then_some(segment)
    }
}

/// Per-category refs scraped from one listing page.
pub type RemoteListing = BTreeMap<Category, Vec<RemoteFileRef>>;

/// Primary computational logs linked from a listing page.
#[must_use]
pub fn primary_log_refs(body: &str) -> Vec<RemoteFileRef> {
    refs_matching(body, Category::PrimaryLog)
}

/// Time-dependent (excited-state) logs linked from a listing page.
#[must_use]
pub fn time_dependent_log_refs(body: &str) -> Vec<RemoteFileRef> {
    refs_matching(body, Category::TimeDependentLog)
}

/// Molecular structure files linked from a listing page.
#[must_use]
pub fn structure_file_refs(body: &str) -> Vec<RemoteFileRef> {
    refs_matching(body, Category::StructureFile)
}

/// Scrapes the refs of one category, collapsing repeated hrefs.
fn refs_matching(body: &str, category: Category) -> Vec<RemoteFileRef> {
    let mut seen = HashSet::new();
    HREF_PATTERN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| RemoteFileRef::new(m.as_str()))
        .filter(|file_ref| category.matches_filename(&file_ref.file_segment()))
        .filter(|file_ref| seen.insert(file_ref.href.clone()))
        .collect()
}

/// Partitions a listing page into the requested categories.
///
/// Every requested category gets an entry, possibly empty.
#[must_use]
pub fn parse_listing(body: &str, categories: &[Category]) -> RemoteListing {
    categories
        .iter()
        .map(|&category| {
            let refs = match category {
                Category::PrimaryLog => primary_log_refs(body),
                Category::TimeDependentLog => time_dependent_log_refs(body),
                Category::StructureFile => structure_file_refs(body),
            };
            (category, refs)
        })
        .collect()
}

/// Fetches one sub-collection listing and partitions it by category.
///
/// # Errors
///
/// Returns a fetch-level [`ArchiveError`] if the page cannot be retrieved.
#[instrument(skip(client, categories), fields(sub_collection = %sub_collection))]
pub async fn list_remote(
    client: &ArchiveClient,
    sub_collection: &SubCollection,
    categories: &[Category],
) -> Result<RemoteListing, ArchiveError> {
    let url = client.resolve(sub_collection.page())?;
    let body = client.fetch_text(&url).await?;
    let listing = parse_listing(&body, categories);
    for (category, refs) in &listing {
        debug!(%category, remote = refs.len(), "listed remote files");
    }
    Ok(listing)
}
