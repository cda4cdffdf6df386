//! Counters shared by the download workers.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Running totals of a download pool.
///
/// Updated concurrently by every worker; readers see a consistent value per
/// counter but not a snapshot across counters.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    retried: AtomicUsize,
    skipped: AtomicUsize,
    bytes_written: AtomicU64,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files fetched and written successfully.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Failed attempts that were put back on the queue.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Files dropped because the server refused them for good.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Total bytes written to disk.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::SeqCst)
    }

    pub(crate) fn record_completed(&self, bytes: u64) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.bytes_written.fetch_add(bytes, Ordering::SeqCst);
    }

    pub(crate) fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }
}
