#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod utils;

// The engine
pub mod engine;

// Re-export commonly used types
pub use data::{CsvSeriesStore, InMemorySeries, SeriesSource, load_query_csv};
pub use domain::{Candidate, FinalMoveStats, PredictionPath, QueryWindow, ResultMatrix};
pub use engine::{CancelToken, ProgressSink, SearchEngine, SearchOutcome, search};
pub use error::{QueryError, ReconstructError, SearchError, SeriesError};

// CLI argument parsing
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// CSV file whose Close column is the raw query series
    #[arg(long)]
    pub query: PathBuf,

    /// Keep only the last N query values
    #[arg(long)]
    pub last: Option<usize>,

    /// Directory of historical series, one CSV file per series
    #[arg(long, default_value = config::PERSISTENCE.corpus.directory)]
    pub corpus: PathBuf,

    /// Number of corpus files to sample (defaults to all of them)
    #[arg(long)]
    pub data_size: Option<usize>,

    /// Steps to predict past the end of the query (defaults to 20% of its length)
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Worker threads (defaults to available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Write the full result (paths and stats) as JSON
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the prediction matrix as CSV, one column per rank
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
