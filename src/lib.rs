//! qcfetch Core Library
//!
//! Mirrors the quantum-chemistry result files an archive publishes as static
//! directory listings. A listing producer crawls every sub-collection page,
//! diffs it against what is already on disk, and feeds the missing files to
//! a fixed pool of retrying download workers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`archive`] - Remote index and listing pages, HTTP session
//! - [`local`] - Scan of files already on disk
//! - [`reconcile`] - Remote-minus-local set difference
//! - [`producer`] - Crawl driver feeding the work queue
//! - [`queue`] - Shared FIFO of pending downloads
//! - [`download`] - Worker pool with unbounded requeue on failure
//! - [`harvest`] - Orchestration of a whole run
//! - [`config`] - Run configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod config;
pub mod download;
pub mod harvest;
pub mod local;
pub mod producer;
pub mod queue;
pub mod reconcile;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use archive::{ArchiveClient, ArchiveError, Category, RemoteFileRef, SubCollection};
pub use config::{ConfigError, HarvestConfig};
pub use download::{DEFAULT_WORKERS, DownloadPool, DownloadStats, RetryPolicy};
pub use harvest::{HarvestError, HarvestSummary, Harvester, ProgressSnapshot};
pub use local::{LocalFileSet, scan_local};
pub use producer::{CrawlStats, ListingProducer};
pub use queue::{QueueDepth, WorkItem, WorkQueue};
pub use reconcile::reconcile;
