//! CLI entry point for qcfetch.

use std::io::{self, IsTerminal, Write};

use anyhow::{Result, bail};
use clap::Parser;
use qcfetch_core::Harvester;
use tracing::{debug, info};

mod app;
mod cli;

use app::access::probe_access;
use app::progress::ProgressReporter;
use app::terminal::{init_tracing, is_dumb_terminal, should_use_spinner};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(args.default_log_level());
    debug!(?args, "CLI arguments parsed");

    let access = probe_access(&args.target);
    if !access.is_usable() {
        bail!(
            "cannot read or write to path {}\n  Please correct this or choose another path.",
            args.target.display()
        );
    }

    let harvester = Harvester::new(args.to_config()?);
    let config = harvester.config();
    info!(
        target = %config.target.display(),
        base_url = %config.base_url,
        categories = ?config.categories,
        workers = config.workers,
        "qcfetch starting"
    );

    if args.dry_run {
        let items = harvester.plan().await?;
        let mut stdout = io::stdout().lock();
        for item in &items {
            serde_json::to_writer(&mut stdout, item)?;
            writeln!(stdout)?;
        }
        stdout.flush()?;
        info!(missing = items.len(), "dry run complete");
        return Ok(());
    }

    let use_spinner = should_use_spinner(io::stderr().is_terminal(), args.quiet, is_dumb_terminal());
    let mut progress = ProgressReporter::new(use_spinner);
    let summary = harvester.run(|snapshot| progress.update(snapshot)).await;
    progress.finish();
    let summary = summary?;

    if let Some(molecules) = summary.announced_molecules {
        info!(molecules, "archive announces molecule count");
    }
    for (category, queued) in &summary.queued {
        info!(category = %category, queued, "category summary");
    }
    info!(
        sub_collections = summary.sub_collections,
        failed_sub_collections = summary.failed_sub_collections,
        completed = summary.completed,
        retried = summary.retried,
        skipped = summary.skipped,
        bytes_written = summary.bytes_written,
        elapsed_secs = summary.elapsed.as_secs(),
        "all downloads finished"
    );
    Ok(())
}
