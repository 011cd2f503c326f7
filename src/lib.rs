//! # Leadscout Core Library
//!
//! Batch lead generation in two stages: listing discovery drives a scripted
//! browser over map-search result feeds and extracts one record per business;
//! contact discovery crawls each record's website for email addresses and
//! optionally verifies them against the domain's mail exchange.
//!
//! The library exposes the two stage runners plus the engines underneath
//! them; the `leadscout` binary wires them to a CLI.

pub mod contact;
mod core;
pub mod listing;
pub mod output;
pub mod query;
pub mod transport;
mod utils;
pub mod verification;

pub use crate::core::config::{Config, ConfigBuilder, ConfigFile, FetchStrategy};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{
    BusinessRecord, EnrichmentStats, ErrorReport, GeoScope, RunReport, SearchTarget,
    NOT_AVAILABLE,
};

use crate::contact::fetch::{HttpFetcher, PageFetcher, RenderFetcher};
use crate::contact::ContactEngine;
use crate::listing::ListingEngine;
use crate::output::progress::{ProgressEvent, ProgressReporter};
use crate::output::CheckpointWriter;
use crate::transport::BrowserSession;
use std::path::Path;
use tokio::time::sleep;

/// Runs the listing discovery stage over every target, sequentially.
///
/// One browser session serves the whole run and is closed on every exit
/// path. A target that yields nothing does not abort the run; if the
/// session itself is lost mid-run, the remaining targets simply come back
/// empty. The final table is always written before returning.
pub async fn run_listing_discovery(
    config: &Config,
    targets: &[SearchTarget],
    reporter: &dyn ProgressReporter,
    out_path: &Path,
) -> Result<Vec<BusinessRecord>> {
    if targets.is_empty() {
        tracing::warn!(target: "pipeline", "No search targets; nothing to do.");
        return Ok(Vec::new());
    }

    let session = BrowserSession::connect(config).await?;
    let engine = ListingEngine::new(config);
    let checkpoint = CheckpointWriter::new(out_path, config.listing_checkpoint_interval, false);

    let total = targets.len();
    let mut records: Vec<BusinessRecord> = Vec::new();

    for (index, target) in targets.iter().enumerate() {
        tracing::info!(target: "pipeline",
            "Listing target {}/{}: {}", index + 1, total, target.url());

        let batch = engine.discover(&session, target).await;
        tracing::info!(target: "pipeline",
            "Target {}/{} produced {} record(s).", index + 1, total, batch.len());
        records.extend(batch);

        reporter.report(&ProgressEvent::new("listings", index + 1, total));
        checkpoint.maybe_write(&records, index + 1);

        if index + 1 < total {
            sleep(config.record_delay).await;
        }
    }

    session.close().await;
    checkpoint.finalize(&records)?;
    tracing::info!(target: "pipeline",
        "Listing discovery finished: {} record(s) -> {}", records.len(), out_path.display());
    Ok(records)
}

/// Runs the contact discovery stage over every record, sequentially.
///
/// The fetch strategy degrades from rendered to plain HTTP when no browser
/// session can be started; a record whose crawl comes up empty keeps the
/// sentinel and never aborts the run. Returns the enriched records with
/// stage statistics.
pub async fn run_contact_discovery(
    config: &Config,
    mut records: Vec<BusinessRecord>,
    reporter: &dyn ProgressReporter,
    out_path: &Path,
) -> Result<(Vec<BusinessRecord>, EnrichmentStats)> {
    let (fetcher, session) = build_fetcher(config).await?;
    let engine = match ContactEngine::new(config, fetcher) {
        Ok(engine) => engine,
        Err(e) => {
            if let Some(session) = session {
                session.close().await;
            }
            return Err(e);
        }
    };

    let checkpoint = CheckpointWriter::new(out_path, config.contact_checkpoint_interval, true);
    let total = records.len();
    let mut stats = EnrichmentStats {
        total_businesses: total,
        ..Default::default()
    };

    for index in 0..total {
        if records[index].has_website() {
            stats.websites_scraped += 1;
            tracing::info!(target: "pipeline",
                "Record {}/{}: crawling {} ({})",
                index + 1, total, records[index].website, records[index].name);

            let found = engine.discover(&records[index].website).await;
            if found == NOT_AVAILABLE {
                records[index].email = None;
            } else {
                stats.emails_found += 1;
                records[index].email = Some(found);
            }
        } else {
            tracing::debug!(target: "pipeline",
                "Record {}/{}: no website, skipping.", index + 1, total);
        }

        reporter.report(&ProgressEvent::new("emails", index + 1, total));
        // Only fully-processed rows go into a checkpoint.
        checkpoint.maybe_write(&records[..=index], index + 1);

        if index + 1 < total {
            sleep(config.record_delay).await;
        }
    }

    if let Some(session) = session {
        session.close().await;
    }

    checkpoint.finalize(&records)?;
    stats.finish();
    tracing::info!(target: "pipeline",
        "Contact discovery finished: {}/{} crawled site(s) yielded email(s).",
        stats.emails_found, stats.websites_scraped);
    Ok((records, stats))
}

/// Builds the page fetcher for the configured strategy, degrading from
/// rendered to plain HTTP when the browser session cannot be started.
async fn build_fetcher(
    config: &Config,
) -> Result<(Box<dyn PageFetcher>, Option<BrowserSession>)> {
    match config.fetch_strategy {
        FetchStrategy::Http => Ok((Box::new(HttpFetcher::new(config)?), None)),
        FetchStrategy::Render => match BrowserSession::connect(config).await {
            Ok(session) => Ok((
                Box::new(RenderFetcher::new(session.clone(), config)),
                Some(session),
            )),
            Err(e) => {
                tracing::warn!(target: "pipeline",
                    "Browser session unavailable ({}); degrading to plain HTTP fetches.", e);
                Ok((Box::new(HttpFetcher::new(config)?), None))
            }
        },
    }
}
