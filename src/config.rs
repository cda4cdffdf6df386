//! Run configuration for a harvest.
//!
//! The binary builds a [`HarvestConfig`] from its command line; library users
//! build one directly. Validation happens once, before any network activity.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::archive::{Category, ClientSettings, DEFAULT_BASE_URL};
use crate::download::{DEFAULT_WORKERS, MAX_WORKERS, MIN_WORKERS, RetryPolicy};

/// Default interval between progress polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration errors detected before a run starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No file category was selected.
    #[error("no file category selected: choose at least one of primary-log, time-dependent-log, structure-file")]
    NoCategories,

    /// Worker count out of range.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The rejected value.
        value: usize,
    },

    /// The base URL cannot have paths joined onto it.
    #[error("invalid archive base URL: {url}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
    },
}

/// Everything a harvest run needs to know.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Local directory receiving `<sub_collection>/<category>/<file>`.
    pub target: PathBuf,
    /// Selected categories, deduplicated, in [`Category::ALL`] order.
    pub categories: Vec<Category>,
    /// Archive root; the index page lives here.
    pub base_url: Url,
    /// Number of concurrent download workers.
    pub workers: usize,
    /// Pause applied before requeueing a failed download.
    pub retry_policy: RetryPolicy,
    /// HTTP session settings shared by the crawler and workers.
    pub client: ClientSettings,
    /// How often the run loop samples progress and checks for completion.
    pub poll_interval: Duration,
}

impl HarvestConfig {
    /// Creates a configuration with defaults for everything but the target
    /// and categories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoCategories`] if `categories` is empty.
    pub fn new(
        target: impl Into<PathBuf>,
        categories: impl IntoIterator<Item = Category>,
    ) -> Result<Self, ConfigError> {
        let mut categories: Vec<Category> = categories.into_iter().collect();
        categories.sort_unstable();
        categories.dedup();
        if categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(|_| ConfigError::InvalidBaseUrl {
            url: DEFAULT_BASE_URL.to_string(),
        })?;

        Ok(Self {
            target: target.into(),
            categories,
            base_url,
            workers: DEFAULT_WORKERS,
            retry_policy: RetryPolicy::default(),
            client: ClientSettings::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Overrides the archive root.
    ///
    /// A missing trailing slash is added so relative listing links resolve
    /// below the root instead of beside it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL cannot be a base.
    pub fn with_base_url(mut self, mut base_url: Url) -> Result<Self, ConfigError> {
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = base_url;
        Ok(self)
    }

    /// Overrides the worker count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWorkers`] if outside `1..=32`.
    pub fn with_workers(mut self, workers: usize) -> Result<Self, ConfigError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(ConfigError::InvalidWorkers { value: workers });
        }
        self.workers = workers;
        Ok(self)
    }

    /// Overrides the retry pause policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Bounds every HTTP request. Requests are unbounded by default.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.client.request_timeout = timeout;
        self
    }

    /// Overrides the progress poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_a_category() {
        let result = HarvestConfig::new("/data", []);
        assert_eq!(result.unwrap_err(), ConfigError::NoCategories);
    }

    #[test]
    fn test_new_dedups_and_orders_categories() {
        let config = HarvestConfig::new(
            "/data",
            [
                Category::StructureFile,
                Category::PrimaryLog,
                Category::StructureFile,
            ],
        )
        .unwrap();
        assert_eq!(
            config.categories,
            [Category::PrimaryLog, Category::StructureFile]
        );
    }

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::new("/data", [Category::PrimaryLog]).unwrap();
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert!(config.retry_policy.is_immediate());
        assert!(config.client.request_timeout.is_none());
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_with_workers_range() {
        let config = HarvestConfig::new("/data", [Category::PrimaryLog]).unwrap();
        assert_eq!(
            config.clone().with_workers(0).unwrap_err(),
            ConfigError::InvalidWorkers { value: 0 }
        );
        assert!(config.clone().with_workers(MAX_WORKERS + 1).is_err());
        assert_eq!(config.with_workers(8).unwrap().workers, 8);
    }

    #[test]
    fn test_with_base_url_adds_trailing_slash() {
        let config = HarvestConfig::new("/data", [Category::PrimaryLog])
            .unwrap()
            .with_base_url(Url::parse("http://mirror.test/archive").unwrap())
            .unwrap();
        assert_eq!(config.base_url.as_str(), "http://mirror.test/archive/");
    }

    #[test]
    fn test_with_base_url_rejects_non_base() {
        let result = HarvestConfig::new("/data", [Category::PrimaryLog])
            .unwrap()
            .with_base_url(Url::parse("data:text/plain,hello").unwrap());
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }
}
