//! Progress UI for harvest runs.
//!
//! On an interactive terminal a spinner shows live counters. Otherwise the
//! same line is logged at a slower cadence.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use qcfetch_core::ProgressSnapshot;
use tracing::info;

const HEADLESS_LOG_EVERY: Duration = Duration::from_secs(30);

pub(crate) struct ProgressReporter {
    spinner: Option<ProgressBar>,
    last_logged: Option<Instant>,
}

impl ProgressReporter {
    pub(crate) fn new(use_spinner: bool) -> Self {
        let spinner = use_spinner.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });
        Self {
            spinner,
            last_logged: None,
        }
    }

    pub(crate) fn update(&mut self, snapshot: &ProgressSnapshot) {
        let message = format_progress(snapshot);
        if let Some(spinner) = &self.spinner {
            spinner.set_message(message);
            return;
        }
        let due = self
            .last_logged
            .is_none_or(|at| at.elapsed() >= HEADLESS_LOG_EVERY);
        if due {
            info!("{message}");
            self.last_logged = Some(Instant::now());
        }
    }

    pub(crate) fn finish(self) {
        if let Some(spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}

pub(crate) fn format_progress(snapshot: &ProgressSnapshot) -> String {
    let listing = if snapshot.listing_finished {
        format!("listed {}", snapshot.sub_collections)
    } else {
        format!(
            "listing {}/{}",
            snapshot.explored, snapshot.sub_collections
        )
    };
    format!(
        "{listing} | downloaded {}/{} ({:.1}%) | pending {} | active {} | retries {}",
        snapshot.completed,
        snapshot.queued,
        snapshot.percent_done(),
        snapshot.depth.pending,
        snapshot.depth.in_flight,
        snapshot.retried,
    )
}
