//! Listing producer: crawls every sub-collection and queues missing files.
//!
//! For each sub-collection, in index order:
//! 1. create the category directories (idempotent)
//! 2. scan what is already on disk
//! 3. fetch the remote listing
//! 4. reconcile and push one [`WorkItem`] per missing file
//!
//! A failure in any step skips that sub-collection only; the crawl goes on.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, info, instrument, warn};

use crate::archive::{ArchiveClient, ArchiveError, Category, SubCollection, list_remote};
use crate::local::scan_local;
use crate::queue::{WorkItem, WorkQueue, category_dir};
use crate::reconcile::reconcile;

/// Crawl progress, readable while the producer runs.
#[derive(Debug, Default)]
pub struct CrawlStats {
    total: AtomicUsize,
    explored: AtomicUsize,
    failed: AtomicUsize,
    queued: [AtomicUsize; 3],
    finished: AtomicBool,
}

impl CrawlStats {
    /// Creates zeroed stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sub-collections the crawl will visit.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Sub-collections visited so far, failed ones included.
    #[must_use]
    pub fn explored(&self) -> usize {
        self.explored.load(Ordering::SeqCst)
    }

    /// Sub-collections skipped because of an error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Work items queued for one category.
    #[must_use]
    pub fn queued(&self, category: Category) -> usize {
        self.queued[category.ordinal()].load(Ordering::SeqCst)
    }

    /// Work items queued across all categories.
    #[must_use]
    pub fn queued_total(&self) -> usize {
        self.queued.iter().map(|q| q.load(Ordering::SeqCst)).sum()
    }

    /// Returns true once every sub-collection has been visited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Drives discovery and reconciliation, feeding the shared queue.
#[derive(Debug)]
pub struct ListingProducer {
    client: ArchiveClient,
    target: PathBuf,
    categories: Vec<Category>,
    queue: Arc<WorkQueue>,
    stats: Arc<CrawlStats>,
}

impl ListingProducer {
    /// Creates a producer writing work for `categories` under `target`.
    #[must_use]
    pub fn new(
        client: ArchiveClient,
        target: impl Into<PathBuf>,
        categories: &[Category],
        queue: Arc<WorkQueue>,
    ) -> Self {
        Self {
            client,
            target: target.into(),
            categories: categories.to_vec(),
            queue,
            stats: Arc::new(CrawlStats::new()),
        }
    }

    /// Crawl counters, shared with the running producer.
    #[must_use]
    pub fn stats(&self) -> Arc<CrawlStats> {
        Arc::clone(&self.stats)
    }

    /// Visits every sub-collection once. Never fails: per sub-collection
    /// errors are logged and skipped. The queue is left open.
    #[instrument(skip_all, fields(sub_collections = sub_collections.len()))]
    pub async fn run(self, sub_collections: Vec<SubCollection>) -> Arc<CrawlStats> {
        self.stats
            .total
            .store(sub_collections.len(), Ordering::SeqCst);

        for sub_collection in &sub_collections {
            if let Err(error) = self.process(sub_collection).await {
                self.stats.failed.fetch_add(1, Ordering::SeqCst);
                warn!(
                    sub_collection = %sub_collection,
                    error = %error,
                    "skipping sub-collection"
                );
            }
            self.stats.explored.fetch_add(1, Ordering::SeqCst);
        }

        self.stats.finished.store(true, Ordering::SeqCst);
        info!(
            explored = self.stats.explored(),
            failed = self.stats.failed(),
            queued = self.stats.queued_total(),
            "listing complete"
        );
        self.stats
    }

    /// Reconciles one sub-collection and queues its missing files.
    ///
    /// Returns the number of work items pushed.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if a directory cannot be created, the scan
    /// task dies, or the remote listing cannot be fetched.
    #[instrument(skip(self), fields(sub_collection = %sub_collection))]
    pub async fn process(&self, sub_collection: &SubCollection) -> Result<usize, ArchiveError> {
        for &category in &self.categories {
            let dir = category_dir(&self.target, sub_collection, category);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| ArchiveError::file_system(&dir, e))?;
        }

        let local_dir = self.target.join(sub_collection.id());
        let local_files = {
            let dir = local_dir.clone();
            let categories = self.categories.clone();
            tokio::task::spawn_blocking(move || scan_local(&dir, &categories))
                .await
                .map_err(|e| ArchiveError::file_system(&local_dir, std::io::Error::other(e)))?
        };

        let remote = list_remote(&self.client, sub_collection, &self.categories).await?;
        let missing = reconcile(&remote, &local_files);

        // Resolve everything before pushing so a bad href skips the whole
        // sub-collection instead of queueing part of it.
        let mut items = Vec::new();
        for (category, refs) in &missing {
            for file_ref in refs {
                let Some(filename) = file_ref.local_filename() else {
                    continue;
                };
                let url = self.client.resolve(file_ref.href())?;
                let destination =
                    WorkItem::destination_for(&self.target, sub_collection, *category, &filename);
                items.push((*category, WorkItem::new(url, destination)));
            }
        }

        let pushed = items.len();
        for (category, item) in items {
            self.queue.push(item);
            self.stats.queued[category.ordinal()].fetch_add(1, Ordering::SeqCst);
        }
        debug!(pushed, "sub-collection reconciled");
        Ok(pushed)
    }
}
