//! Concurrent, retrying file downloads.
//!
//! A [`DownloadPool`] runs a fixed number of [`DownloadWorker`]s against a
//! shared [`WorkQueue`](crate::queue::WorkQueue). Transient failures are
//! requeued indefinitely; a final status such as 404 drops the item.
//! [`RetryPolicy`] only controls the pause before a retry.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qcfetch_core::archive::ArchiveClient;
//! use qcfetch_core::download::{DEFAULT_WORKERS, DownloadPool, RetryPolicy};
//! use qcfetch_core::queue::WorkQueue;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ArchiveClient::new(Url::parse("http://pubchemqc.riken.jp/")?)?;
//! let queue = Arc::new(WorkQueue::new());
//! let pool = DownloadPool::spawn(DEFAULT_WORKERS, &client, &RetryPolicy::default(), Arc::clone(&queue))?;
//! // ... push work, wait for queue.is_idle() ...
//! queue.close();
//! let stats = pool.join().await;
//! println!("Completed: {}, Retried: {}", stats.completed(), stats.retried());
//! # Ok(())
//! # }
//! ```

mod retry;
mod stats;
mod worker;

pub use retry::RetryPolicy;
pub use stats::DownloadStats;
pub use worker::{
    DEFAULT_WORKERS, DownloadPool, DownloadWorker, MAX_WORKERS, MIN_WORKERS, PoolError,
    WorkerState,
};
