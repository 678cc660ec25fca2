//! # Article Extractor
//!
//! A resilient content extraction pipeline. Given article URLs discovered by
//! upstream feed crawlers, it downloads each page, extracts clean article
//! text and metadata, and persists the result or a classified failure.
//!
//! ## Features
//!
//! - Resolves aggregator redirect links (Google News) before fetching
//! - Spaces requests to the same host by a configurable minimum interval
//! - Structured extraction with retries and exponential backoff, then a
//!   generic paragraph-scrape fallback
//! - Persistent failure tracking so dead links are never retried and flaky
//!   ones are retried a bounded number of times
//!
//! ## Usage
//!
//! ```sh
//! article_extractor --store ./store.json enqueue urls.txt --source reuters
//! article_extractor --store ./store.json batch --limit 20 --days 3
//! article_extractor --store ./store.json run
//! ```
//!
//! ## Architecture
//!
//! 1. **Selection**: pending candidates, newest first, still eligible for retry
//! 2. **Resolution**: indirection links are followed to the real article
//! 3. **Extraction**: structured strategy with retries, then the fallback
//! 4. **Persistence**: a result, or a failure record with a retry verdict

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extractors;
mod fetch;
mod limiter;
mod models;
mod orchestrator;
mod outputs;
mod resolver;
mod retry;
mod shutdown;
mod state;
mod store;
mod tracker;
mod utils;

use cli::{BatchArgs, Cli, Command, EnqueueArgs};
use config::PipelineConfig;
use extractors::{FallbackExtractor, StructuredExtractor};
use fetch::HttpFetcher;
use models::ArticleCandidate;
use orchestrator::Orchestrator;
use resolver::RedirectResolver;
use retry::RetryController;
use state::PipelineState;
use store::{JsonStore, Store};
use utils::parse_url_list;

/// First backoff delay; doubles after every failed structured attempt.
const BASE_BACKOFF: Duration = Duration::from_secs(1);

type Pipeline =
    Orchestrator<JsonStore, RedirectResolver, StructuredExtractor, FallbackExtractor>;

fn build_pipeline(
    store: Arc<JsonStore>,
    config: PipelineConfig,
) -> Result<Pipeline, Box<dyn Error>> {
    let fetcher = HttpFetcher::from_config(&config)?;
    let resolver = RedirectResolver::new(fetcher.clone(), config.indirection_hosts.clone());
    let primary = StructuredExtractor::new(fetcher.clone(), config.min_content_chars);
    let fallback = FallbackExtractor::new(fetcher, config.min_content_chars);
    let state = Arc::new(PipelineState::new(config.min_interval()));
    let controller = RetryController::new(
        resolver,
        primary,
        fallback,
        state,
        config.max_retries,
        BASE_BACKOFF,
    );
    let shutdown = shutdown::spawn_ctrl_c_handler();
    Ok(Orchestrator::new(store, controller, config, shutdown))
}

#[instrument(level = "info", skip_all, fields(file = %args.file.display(), source = %args.source))]
async fn enqueue(store: &JsonStore, args: &EnqueueArgs) -> Result<(), Box<dyn Error>> {
    let text = tokio::fs::read_to_string(&args.file).await?;
    let (urls, rejected) = parse_url_list(&text);
    if rejected > 0 {
        warn!(rejected, "Skipped lines that are not http(s) URLs");
    }

    let now = chrono::Utc::now();
    let mut added = 0usize;
    for url in urls {
        let candidate = ArticleCandidate {
            id: store.next_candidate_id().await?,
            url,
            source: args.source.clone(),
            discovered_at: now,
        };
        if store.insert_candidate(candidate).await? {
            added += 1;
        }
    }
    info!(added, "Enqueued candidates");
    Ok(())
}

async fn batch(
    store: Arc<JsonStore>,
    config: PipelineConfig,
    args: &BatchArgs,
) -> Result<(), Box<dyn Error>> {
    let limit = args.limit.unwrap_or(config.batch_size);
    let days = args.days.unwrap_or(config.default_days);
    let pipeline = build_pipeline(store, config)?;
    let query = pipeline.query(limit, Some(days), args.source.as_deref())?;

    if args.dry_run {
        let plan = pipeline.plan_batch(&query).await?;
        for candidate in &plan {
            println!(
                "{}\t{}\t{}\t{}",
                candidate.id,
                candidate.source,
                candidate.discovered_at.to_rfc3339(),
                candidate.url
            );
        }
        info!(count = plan.len(), "Dry run complete, nothing fetched");
        return Ok(());
    }

    let report = pipeline.run_batch(&query).await?;
    info!(
        selected = report.selected,
        succeeded = report.succeeded,
        failed = report.failed,
        skipped = report.skipped,
        "Batch finished"
    );
    pipeline.report_statistics().await?;
    Ok(())
}

#[tokio::main]
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
    info!("article_extractor starting up");

    let args = Cli::parse();
    debug!(store = %args.store.display(), config = ?args.config, "Parsed CLI arguments");

    let mut config = PipelineConfig::load(args.config.as_deref())?;
    if let Command::Run(run) = &args.command {
        if let Some(interval) = run.interval {
            config.base_interval_secs = interval;
        }
        if let Some(batch_size) = run.batch_size {
            config.batch_size = batch_size;
        }
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration after applying CLI flags");
        return Err(e.into());
    }

    let store = Arc::new(JsonStore::open(&args.store).await?);

    match &args.command {
        Command::Run(_) => {
            let batch_size = config.batch_size;
            let pipeline = build_pipeline(store, config)?;
            let cycles = pipeline.run_continuously(batch_size).await;
            info!(cycles, "Continuous mode finished");
        }
        Command::Batch(batch_args) => batch(store, config, batch_args).await?,
        Command::Stats => {
            let stats = store.statistics().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Enqueue(enqueue_args) => enqueue(&store, enqueue_args).await?,
        Command::Export(export_args) => {
            let results = store.results().await?;
            outputs::json::write_results(&results, &export_args.output).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
