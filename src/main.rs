//! # Awful News Archive
//!
//! Archives a news site to disk: discovers article links on a listing page,
//! extracts each article, skips anything already archived, downloads its
//! media and commits it into a date-partitioned folder tree with JSON, CSV
//! and Markdown exports.
//!
//! ## Usage
//!
//! ```sh
//! awful_news_archive https://news.example.com -o ./archive -n 25
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: Render the seed page and collect article-shaped links
//! 2. **Extraction**: Render each candidate and extract title, byline, date,
//!    body, tags and media references (retried on failure)
//! 3. **Dedup**: Skip URLs and titles already in the archive index
//! 4. **Media**: Download images and video files into a staging area
//! 5. **Commit**: Move everything into the entry folder and write its records
//! 6. **Export**: Rebuild `articles.json`, `articles.csv`, `index.json`,
//!    `summary.json` and `ARCHIVE_INDEX.md`

use clap::Parser;
use std::error::Error;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod archive;
mod cli;
mod config;
mod downloader;
mod error;
mod fetcher;
mod jobs;
mod models;
mod outputs;
mod pipeline;
mod retry;
mod scrapers;
mod utils;

use cli::Cli;
use config::ArchiveConfig;
use fetcher::HttpFetcher;
use jobs::JobStore;
use pipeline::{Orchestrator, rebuild_exports};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_news_archive starting up");

    let args = Cli::parse();
    debug!(url = %args.url, ?args.archive_root, ?args.config, "Parsed CLI arguments");

    let config = ArchiveConfig::resolve(&args)?;
    debug!(?config, "Effective configuration");

    // Early check: the archive root must be writable before any network work
    if let Err(e) = ensure_writable_dir(&config.archive_root).await {
        error!(
            path = %config.archive_root.display(),
            error = %e,
            "Archive root is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    if args.export_only {
        let summary = rebuild_exports(&config, &args.url).await?;
        info!(
            domain = %summary.domain,
            total_articles = summary.total_articles,
            total_words = summary.total_words,
            "Exports rebuilt"
        );
        return Ok(());
    }

    let fetcher = HttpFetcher::new(&config.user_agent)?;
    let media_client = fetcher.client();

    let (tx, rx) = unbounded_channel();
    let jobs = tokio::spawn(async move {
        let mut store = JobStore::new();
        let id = store.create();
        store.follow(id, rx).await;
        store.get(id).cloned()
    });

    let orchestrator = Orchestrator::new(fetcher, media_client, config, tx);
    let result = orchestrator.run(&args.url).await;
    // closes the event channel so the job follower finishes
    drop(orchestrator);

    match jobs.await {
        Ok(Some(record)) => debug!(
            status = %record.status,
            progress = record.progress,
            log_lines = record.log.len(),
            "Job finished"
        ),
        Ok(None) => {}
        Err(e) => error!(error = %e, "Job follower panicked"),
    }

    let report = result?;
    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        discovered = report.discovered,
        scraped = report.scraped,
        duplicates = report.duplicates,
        failed = report.failed,
        "Execution complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
