//! End-to-end harvest: index → producer → queue → workers → disk.
//!
//! [`Harvester::run`] is the only place that owns every moving part. It
//! polls at a fixed interval, hands a [`ProgressSnapshot`] to the caller on
//! each tick, and finishes once the producer is done and the queue holds
//! neither pending nor in-flight work.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::archive::{ArchiveClient, ArchiveError, Category, fetch_index};
use crate::config::HarvestConfig;
use crate::download::{DownloadPool, DownloadStats, PoolError};
use crate::producer::{CrawlStats, ListingProducer};
use crate::queue::{QueueDepth, WorkItem, WorkQueue};

/// Errors that abort a harvest.
///
/// Anything that goes wrong after startup is logged and retried or skipped
/// instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The HTTP session could not be created.
    #[error("could not create HTTP session: {0}")]
    Client(#[source] ArchiveError),

    /// The root index could not be fetched or parsed.
    #[error("could not read archive index: {0}")]
    Index(#[source] ArchiveError),

    /// The worker pool could not be started.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Counters sampled on every poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Sub-collections in the index.
    pub sub_collections: usize,
    /// Sub-collections visited so far.
    pub explored: usize,
    /// Whether the producer has visited every sub-collection.
    pub listing_finished: bool,
    /// Work items produced so far.
    pub queued: usize,
    /// Queue occupancy.
    pub depth: QueueDepth,
    /// Files written so far.
    pub completed: usize,
    /// Failed attempts requeued so far.
    pub retried: usize,
    /// Time since workers started.
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    fn capture(
        crawl: &CrawlStats,
        queue: &WorkQueue,
        downloads: &DownloadStats,
        elapsed: Duration,
    ) -> Self {
        Self {
            sub_collections: crawl.total(),
            explored: crawl.explored(),
            listing_finished: crawl.is_finished(),
            queued: crawl.queued_total(),
            depth: queue.depth(),
            completed: downloads.completed(),
            retried: downloads.retried(),
            elapsed,
        }
    }

    /// Share of produced work that has been written, in percent.
    #[must_use]
    pub fn percent_done(&self) -> f64 {
        if self.queued == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.completed as f64 / self.queued as f64;
        (ratio * 100.0).min(100.0)
    }
}

/// Outcome of a completed harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Molecule count announced by the archive, if any.
    pub announced_molecules: Option<u64>,
    /// Sub-collections listed in the index.
    pub sub_collections: usize,
    /// Sub-collections skipped because of an error.
    pub failed_sub_collections: usize,
    /// Work items produced per selected category.
    pub queued: BTreeMap<Category, usize>,
    /// Files written.
    pub completed: usize,
    /// Failed attempts that were requeued.
    pub retried: usize,
    /// Files dropped after a final error status.
    pub skipped: usize,
    /// Bytes written.
    pub bytes_written: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
}

/// Runs harvests for one configuration.
#[derive(Debug, Clone)]
pub struct Harvester {
    config: HarvestConfig,
}

impl Harvester {
    /// Creates a harvester.
    #[must_use]
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    fn client(&self) -> Result<ArchiveClient, HarvestError> {
        ArchiveClient::with_settings(self.config.base_url.clone(), self.config.client.clone())
            .map_err(HarvestError::Client)
    }

    /// Discovers, reconciles and downloads everything missing locally.
    ///
    /// `on_progress` is called on every poll tick, and once more with the
    /// final counters.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Index`] if the root index cannot be read;
    /// nothing has been queued at that point. Per sub-collection and per file
    /// failures never surface here.
    #[instrument(skip_all, fields(target = %self.config.target.display()))]
    pub async fn run<F>(&self, mut on_progress: F) -> Result<HarvestSummary, HarvestError>
    where
        F: FnMut(&ProgressSnapshot),
    {
        let started = Instant::now();
        let client = self.client()?;
        let index = fetch_index(&client).await.map_err(HarvestError::Index)?;
        let sub_collections = index.sub_collections.len();

        let queue = Arc::new(WorkQueue::new());
        let producer = ListingProducer::new(
            client.clone(),
            &self.config.target,
            &self.config.categories,
            Arc::clone(&queue),
        );
        let crawl = producer.stats();
        let producer_handle = tokio::spawn(producer.run(index.sub_collections));

        let pool = match DownloadPool::spawn(
            self.config.workers,
            &client,
            &self.config.retry_policy,
            Arc::clone(&queue),
        ) {
            Ok(pool) => pool,
            Err(error) => {
                producer_handle.abort();
                return Err(error.into());
            }
        };
        let downloads = pool.stats();

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            ticker.tick().await;
            on_progress(&ProgressSnapshot::capture(
                &crawl,
                &queue,
                &downloads,
                started.elapsed(),
            ));
            // The producer pushes before it finishes, and a claim moves an
            // item from pending to in-flight atomically.
            if producer_handle.is_finished() && queue.is_idle() {
                break;
            }
        }

        queue.close();
        let downloads = pool.join().await;
        if let Err(e) = producer_handle.await {
            warn!(error = %e, "listing producer panicked");
        }

        on_progress(&ProgressSnapshot::capture(
            &crawl,
            &queue,
            &downloads,
            started.elapsed(),
        ));

        let summary = HarvestSummary {
            announced_molecules: index.total_count,
            sub_collections,
            failed_sub_collections: crawl.failed(),
            queued: self
                .config
                .categories
                .iter()
                .map(|&category| (category, crawl.queued(category)))
                .collect(),
            completed: downloads.completed(),
            retried: downloads.retried(),
            skipped: downloads.skipped(),
            bytes_written: downloads.bytes_written(),
            elapsed: started.elapsed(),
        };
        info!(
            completed = summary.completed,
            retried = summary.retried,
            skipped = summary.skipped,
            failed_sub_collections = summary.failed_sub_collections,
            elapsed_secs = summary.elapsed.as_secs(),
            "harvest complete"
        );
        Ok(summary)
    }

    /// Lists what [`run`](Self::run) would download, without downloading.
    ///
    /// Category directories are still created, as the producer always does.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Index`] if the root index cannot be read.
    #[instrument(skip_all, fields(target = %self.config.target.display()))]
    pub async fn plan(&self) -> Result<Vec<WorkItem>, HarvestError> {
        let client = self.client()?;
        let index = fetch_index(&client).await.map_err(HarvestError::Index)?;

        let queue = Arc::new(WorkQueue::new());
        let producer = ListingProducer::new(
            client,
            &self.config.target,
            &self.config.categories,
            Arc::clone(&queue),
        );
        producer.run(index.sub_collections).await;

        queue.close();
        let mut items = Vec::with_capacity(queue.len());
        while let Some(item) = queue.pop().await {
            queue.complete();
            items.push(item);
        }
        Ok(items)
    }
}
