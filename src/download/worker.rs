//! Download workers and the fixed-size pool that runs them.
//!
//! Each worker loops: claim an item, GET the URL, write the body verbatim to
//! the item's destination. A transient failure (network error, 5xx, 429,
//! write error) renews the worker's HTTP session and puts an identical item
//! back at the tail of the queue, with no attempt cap. Any other error status
//! is final: the item is logged and dropped without writing.
//!
//! ```text
//!           ┌──────── ok / final status ──┐
//!           ▼                             │
//!         Idle ──pop──► Fetching ──► Writing
//!           ▲              │            │
//!           │          transient    transient
//!           │              ▼            │
//!           └─requeue── FailedRetry ◄───┘
//! ```

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use super::retry::RetryPolicy;
use super::stats::DownloadStats;
use crate::archive::{ArchiveClient, ArchiveError};
use crate::queue::{WorkItem, WorkQueue};

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 32;

/// Default worker count.
pub const DEFAULT_WORKERS: usize = 3;

/// Error type for pool construction.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A worker session could not be created.
    #[error("could not create worker session: {0}")]
    Session(#[from] ArchiveError),
}

/// Where a worker is in handling its current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for an item.
    Idle,
    /// Requesting the remote file.
    Fetching,
    /// Writing the body to disk.
    Writing,
    /// The attempt failed; the item is about to be requeued.
    FailedRetry,
}

/// A single download worker with its own HTTP session.
#[derive(Debug)]
pub struct DownloadWorker {
    id: usize,
    client: ArchiveClient,
    retry_policy: RetryPolicy,
    consecutive_failures: u32,
    state: WorkerState,
}

impl DownloadWorker {
    /// Creates an idle worker.
    #[must_use]
    pub fn new(id: usize, client: ArchiveClient, retry_policy: RetryPolicy) -> Self {
        Self {
            id,
            client,
            retry_policy,
            consecutive_failures: 0,
            state: WorkerState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Processes items until the queue is closed and drained.
    #[instrument(skip_all, fields(worker = self.id))]
    pub async fn run(mut self, queue: Arc<WorkQueue>, stats: Arc<DownloadStats>) {
        debug!("worker started");
        while let Some(item) = queue.pop().await {
            self.handle(&queue, &stats, item).await;
        }
        debug!("queue closed, worker exiting");
    }

    /// Runs one item through the state machine and releases its claim.
    pub async fn handle(&mut self, queue: &WorkQueue, stats: &DownloadStats, item: WorkItem) {
        match self.download(&item).await {
            Ok(bytes) => {
                self.consecutive_failures = 0;
                stats.record_completed(bytes);
                queue.complete();
                debug!(
                    url = %item.url,
                    path = %item.destination.display(),
                    bytes,
                    "download completed"
                );
            }
            Err(error) if !error.is_retryable() => {
                stats.record_skipped();
                queue.complete();
                warn!(
                    url = %item.url,
                    error = %error,
                    "download refused by server, dropping"
                );
            }
            Err(error) => {
                self.transition(WorkerState::FailedRetry);
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!(
                    url = %item.url,
                    error = %error,
                    consecutive_failures = self.consecutive_failures,
                    "download failed, requeueing"
                );
                self.renew_session();

                let delay = self.retry_policy.delay_for(self.consecutive_failures);
                if !delay.is_zero() {
                    debug!(delay_ms = delay.as_millis(), "pausing before requeue");
                    tokio::time::sleep(delay).await;
                }
                stats.record_retry();
                queue.requeue(item);
            }
        }
        self.transition(WorkerState::Idle);
    }

    async fn download(&mut self, item: &WorkItem) -> Result<u64, ArchiveError> {
        self.transition(WorkerState::Fetching);
        let body = self.client.fetch_bytes(&item.url).await?;

        self.transition(WorkerState::Writing);
        tokio::fs::write(&item.destination, &body)
            .await
            .map_err(|e| ArchiveError::file_system(&item.destination, e))?;

        Ok(body.len() as u64)
    }

    fn renew_session(&mut self) {
        match self.client.renewed() {
            Ok(client) => self.client = client,
            Err(error) => warn!(error = %error, "session renewal failed, keeping previous session"),
        }
    }

    fn transition(&mut self, next: WorkerState) {
        trace!(from = ?self.state, to = ?next, "worker state");
        self.state = next;
    }
}

/// Fixed-size set of workers draining one [`WorkQueue`].
#[derive(Debug)]
pub struct DownloadPool {
    handles: Vec<JoinHandle<()>>,
    stats: Arc<DownloadStats>,
}

impl DownloadPool {
    /// Spawns `workers` workers, each with its own session derived from `client`.
    ///
    /// Workers run until the queue is closed; see [`WorkQueue::close`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidWorkers`] if the count is outside
    /// `1..=32`, or [`PoolError::Session`] if a session cannot be built.
    #[instrument(level = "debug", skip(client, retry_policy, queue))]
    pub fn spawn(
        workers: usize,
        client: &ArchiveClient,
        retry_policy: &RetryPolicy,
        queue: Arc<WorkQueue>,
    ) -> Result<Self, PoolError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(PoolError::InvalidWorkers { value: workers });
        }

        let stats = Arc::new(DownloadStats::new());
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let worker = DownloadWorker::new(id, client.renewed()?, retry_policy.clone());
            handles.push(tokio::spawn(
                worker.run(Arc::clone(&queue), Arc::clone(&stats)),
            ));
        }

        info!(
            workers,
            immediate_retry = retry_policy.is_immediate(),
            "download workers started"
        );
        Ok(Self { handles, stats })
    }

    /// Counters shared with the running workers.
    #[must_use]
    pub fn stats(&self) -> Arc<DownloadStats> {
        Arc::clone(&self.stats)
    }

    /// Number of workers in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if the pool has no workers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every worker to exit. Only returns after the queue is closed.
    pub async fn join(self) -> Arc<DownloadStats> {
        for result in join_all(self.handles).await {
            // A panicking worker is logged; the others keep their results.
            if let Err(e) = result {
                warn!(error = %e, "download worker panicked");
            }
        }
        self.stats
    }
}
