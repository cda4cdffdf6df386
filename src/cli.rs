//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use url::Url;

use qcfetch_core::archive::DEFAULT_BASE_URL;
use qcfetch_core::{Category, DEFAULT_WORKERS, HarvestConfig, RetryPolicy};

/// Mirror quantum-chemistry result files from a static directory-listing archive.
///
/// Crawls every sub-collection of the archive, skips files already present
/// under TARGET, and downloads the rest with a pool of retrying workers.
#[derive(Parser, Debug)]
#[command(name = "qcfetch")]
#[command(author, version, about)]
#[command(group(
    ArgGroup::new("categories")
        .required(true)
        .multiple(true)
        .args(["primary_log", "time_dependent_log", "structure_file"])
))]
pub struct Args {
    /// Folder that will contain the downloaded content
    pub target: PathBuf,

    /// Download primary computational logs (.log.xz)
    #[arg(long = "log", visible_alias = "primary-log")]
    pub primary_log: bool,

    /// Download time-dependent (excited-state) logs (.td...log.xz)
    #[arg(long = "tdlog", visible_alias = "time-dependent-log")]
    pub time_dependent_log: bool,

    /// Download molecular structure files (.mol)
    #[arg(long = "mol", visible_alias = "structure-file")]
    pub structure_file: bool,

    /// Concurrent download workers (1-32)
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub workers: u8,

    /// Archive root URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Pause before retrying a failed download in milliseconds, doubled per consecutive failure (0 retries immediately, max 60000)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds (1-3600; requests are unbounded when unset)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: Option<u64>,

    /// Print missing files as JSON lines instead of downloading them
    #[arg(long)]
    pub dry_run: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Selected categories, in [`Category::ALL`] order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        [
            (self.primary_log, Category::PrimaryLog),
            (self.time_dependent_log, Category::TimeDependentLog),
            (self.structure_file, Category::StructureFile),
        ]
        .into_iter()
        .filter_map(|(selected, category)| selected.then_some(category))
        .collect()
    }

    /// Default log level from the verbosity flags.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Builds the run configuration.
    pub fn to_config(&self) -> Result<HarvestConfig> {
        let retry_policy = if self.retry_delay_ms == 0 {
            RetryPolicy::immediate()
        } else {
            RetryPolicy::with_base_delay(Duration::from_millis(self.retry_delay_ms))
        };
        let config = HarvestConfig::new(&self.target, self.categories())?
            .with_base_url(self.base_url.clone())?
            .with_workers(usize::from(self.workers))?
            .with_retry_policy(retry_policy)
            .with_request_timeout(self.timeout_secs.map(Duration::from_secs));
        Ok(config)
    }
}
