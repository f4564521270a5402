use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use analog_scan::engine::LogProgress;
use analog_scan::{Cli, CsvSeriesStore, SearchEngine, load_query_csv};

fn main() -> Result<()> {
    // A. Init Logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // B. Parse Args
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    // C. Build the query and the engine
    let query = load_query_csv(&args.query, args.last)?;
    let store = CsvSeriesStore::new(&args.corpus);

    let mut engine = SearchEngine::new(query, Arc::new(store));
    if let Some(horizon) = args.horizon {
        engine = engine.with_horizon(horizon);
    }
    if let Some(data_size) = args.data_size {
        engine = engine.with_data_size(data_size);
    }
    if let Some(workers) = args.workers {
        engine = engine.with_workers(workers);
    }

    // D. Search
    let outcome = engine
        .try_search(&LogProgress)
        .context(format!("Search over {:?} failed", args.corpus))?;
    let matrix = &outcome.matrix;

    // E. Report
    println!(
        "{} matches from {} candidates ({} files scanned, {} skipped) in {}ms",
        matrix.len(),
        outcome.stats.candidates,
        outcome.stats.files_scanned,
        outcome.stats.files_failed,
        outcome.stats.duration_ms
    );
    if let (Some(mean), Some(stats)) = (matrix.mean_path(), matrix.final_move_stats()) {
        let consensus = mean[mean.len() - 1];
        println!(
            "Consensus after {} steps: {:+.3}% (median {:+.3}%, sd {:.3}%, range {:+.3}% .. {:+.3}%)",
            engine.horizon(),
            (consensus - 1.0) * 100.0,
            (stats.median - 1.0) * 100.0,
            stats.std_dev * 100.0,
            (stats.min - 1.0) * 100.0,
            (stats.max - 1.0) * 100.0
        );
    }

    if let Some(path) = &args.output {
        let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &outcome)
            .context(format!("Failed to write JSON to {}", path.display()))?;
        log::info!("Wrote result to {}", path.display());
    }
    if let Some(path) = &args.csv {
        let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
        matrix.write_csv(BufWriter::new(file))?;
        log::info!("Wrote prediction matrix to {}", path.display());
    }

    Ok(())
}
