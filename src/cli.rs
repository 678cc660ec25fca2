//! Command-line interface definitions for the article extractor.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Global options can also be provided through environment variables.

use crate::config::MAX_DAY_WINDOW;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the article extractor.
///
/// # Examples
///
/// ```sh
/// # Load discovered URLs, then process one batch from the last three days
/// article_extractor --store ./store.json enqueue urls.txt --source reuters
/// article_extractor --store ./store.json batch --limit 20 --days 3
///
/// # Run forever with a custom config
/// article_extractor --store ./store.json --config config.yaml run --interval 600
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON store file
    #[arg(short, long, env = "EXTRACTOR_STORE", default_value = "extractor_store.json")]
    pub store: PathBuf,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process batches continuously until interrupted
    Run(RunArgs),
    /// Process a single batch
    Batch(BatchArgs),
    /// Print extraction statistics
    Stats,
    /// Load URLs (one per line) as extraction candidates
    Enqueue(EnqueueArgs),
    /// Write every stored result to a JSON file
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Seconds to sleep after a batch with at least one success
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Candidates per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Maximum number of candidates to process
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Only candidates discovered in the last N days
    #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..=MAX_DAY_WINDOW))]
    pub days: Option<i64>,

    /// Only candidates from this source
    #[arg(short, long)]
    pub source: Option<String>,

    /// List the candidates that would be processed without fetching anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct EnqueueArgs {
    /// File with one URL per line; blank lines and `#` comments are skipped
    pub file: PathBuf,

    /// Source label recorded on every candidate
    #[arg(short, long, default_value = "manual")]
    pub source: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination JSON file
    pub output: PathBuf,
}
