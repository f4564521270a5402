use std::ops::Range;

use serde::Serialize;

use crate::analysis::scanner::SeriesScan;
use crate::domain::{Candidate, ResultMatrix};

/// The result a worker hands back for its partition
#[derive(Debug, Clone, Default)]
pub struct PartitionScan {
    pub worker_id: usize,
    pub files: Range<usize>,
    pub candidates: Vec<Candidate>,

    pub files_scanned: usize,
    pub files_failed: usize,
    pub offsets_examined: usize,
    pub offsets_scored: usize,
    pub series_diverged: usize,

    pub cancelled: bool,
    pub duration_ms: u128,
}

impl PartitionScan {
    pub fn empty(worker_id: usize, files: Range<usize>) -> Self {
        Self {
            worker_id,
            files,
            ..Default::default()
        }
    }

    /// Fold one series' scan into the partition totals.
    pub fn absorb(&mut self, scan: SeriesScan) {
        self.files_scanned += 1;
        self.offsets_examined += scan.offsets_examined;
        self.offsets_scored += scan.offsets_scored;
        if scan.diverged_at.is_some() {
            self.series_diverged += 1;
        }
        self.candidates.extend(scan.candidates);
    }
}

/// Aggregate counters for one search call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchStats {
    pub workers: usize,
    pub files_per_worker: usize,
    pub files_scanned: usize,
    pub files_failed: usize,
    pub workers_failed: usize,
    pub offsets_examined: usize,
    pub offsets_scored: usize,
    pub series_diverged: usize,
    pub candidates: usize,
    pub paths: usize,
    pub cancelled: bool,
    pub duration_ms: u128,
}

impl SearchStats {
    pub fn absorb(&mut self, report: &PartitionScan) {
        self.files_scanned += report.files_scanned;
        self.files_failed += report.files_failed;
        self.offsets_examined += report.offsets_examined;
        self.offsets_scored += report.offsets_scored;
        self.series_diverged += report.series_diverged;
        self.candidates += report.candidates.len();
        self.cancelled |= report.cancelled;
    }
}

/// What `try_search` returns: the matrix plus how we got there.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub matrix: ResultMatrix,
    pub stats: SearchStats,
}
