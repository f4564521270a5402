use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::analysis::scanner::CorpusScanner;
#[cfg(debug_assertions)]
use crate::config::debug::PRINT_WORKER_SUMMARY;
use crate::data::SeriesSource;

use super::messages::PartitionScan;
use super::progress::ProgressTracker;

/// Run one worker's scan. A panic anywhere inside the scan is contained here and turned
/// into an empty report so sibling workers keep their results. The failed partition still
/// counts as done for progress.
pub fn run_partition(
    scanner: &CorpusScanner,
    source: &dyn SeriesSource,
    names: &[String],
    worker_id: usize,
    files: Range<usize>,
    progress: &ProgressTracker,
) -> PartitionScan {
    let start = Instant::now();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        scanner.scan_partition(source, names, files.clone(), worker_id, progress)
    }));

    let mut report = match outcome {
        Ok(report) => report,
        Err(payload) => {
            log::error!(
                "Worker {} failed scanning files {:?}: {}",
                worker_id,
                files,
                panic_message(payload.as_ref())
            );
            progress.complete_worker(worker_id, files.len());
            PartitionScan::empty(worker_id, files)
        }
    };
    report.duration_ms = start.elapsed().as_millis();

    #[cfg(debug_assertions)]
    if PRINT_WORKER_SUMMARY {
        log::info!(
            "Worker {} done: {} files ({} failed), {} offsets ({} scored), {} candidates in {}ms",
            report.worker_id,
            report.files_scanned,
            report.files_failed,
            report.offsets_examined,
            report.offsets_scored,
            report.candidates.len(),
            report.duration_ms
        );
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
