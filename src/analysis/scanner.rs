use std::ops::Range;
use std::sync::Arc;

use crate::analysis::similarity::score;
use crate::config::PruneSettings;
#[cfg(debug_assertions)]
use crate::config::debug::PRINT_PRUNE_EVENTS;
use crate::data::SeriesSource;
use crate::domain::{Candidate, QueryWindow};
use crate::engine::messages::PartitionScan;
use crate::engine::progress::{CancelToken, ProgressTracker};

/// Pruning thresholds resolved for one query window length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruneThresholds {
    /// Above this distance the rest of the series is abandoned.
    pub divergence: f64,
    /// Above this distance (and below `divergence`) a match is weak.
    pub weak_match: f64,
    /// Offsets skipped without scoring after a weak match.
    pub skip_len: usize,
}

impl PruneThresholds {
    pub fn for_window(window_len: usize, settings: &PruneSettings) -> Self {
        let len = window_len as f64;
        Self {
            divergence: len / settings.divergence_divisor,
            weak_match: len / settings.weak_match_divisor * settings.weak_match_factor,
            skip_len: window_len / settings.skip_divisor,
        }
    }
}

/// What one series yielded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesScan {
    pub candidates: Vec<Candidate>,
    /// Offsets visited, skipped ones included.
    pub offsets_examined: usize,
    /// Offsets actually scored.
    pub offsets_scored: usize,
    /// Offset at which the divergence stop abandoned the series.
    pub diverged_at: Option<usize>,
}

/// Sliding-window scanner for one worker. Holds no per-series state between calls.
#[derive(Debug, Clone)]
pub struct CorpusScanner {
    query: Arc<QueryWindow>,
    horizon: usize,
    thresholds: PruneThresholds,
    cancel: CancelToken,
}

impl CorpusScanner {
    pub fn new(
        query: Arc<QueryWindow>,
        horizon: usize,
        thresholds: PruneThresholds,
        cancel: CancelToken,
    ) -> Self {
        Self {
            query,
            horizon,
            thresholds,
            cancel,
        }
    }

    pub fn thresholds(&self) -> &PruneThresholds {
        &self.thresholds
    }

    /// Slide the query across one series, offsets strictly increasing from 0 up to and
    /// including `len - window_len - horizon`. Series too short for one window plus the
    /// horizon yield nothing.
    pub fn scan_series(&self, series_index: usize, closes: &[f64]) -> SeriesScan {
        let window_len = self.query.len();
        let needed = window_len + self.horizon;
        let mut scan = SeriesScan::default();

        if closes.len() < needed {
            return scan;
        }
        let last_offset = closes.len() - needed;

        // Countdown of offsets to pass over after a weak match; local to this series
        let mut skip_remaining = 0usize;

        for offset in 0..=last_offset {
            if self.cancel.is_cancelled() {
                break;
            }
            scan.offsets_examined += 1;

            if skip_remaining > 0 {
                skip_remaining -= 1;
                continue;
            }

            let window = &closes[offset..offset + window_len];
            let distance = score(window, self.query.values());
            scan.offsets_scored += 1;

            if distance > self.thresholds.divergence {
                scan.diverged_at = Some(offset);

                #[cfg(debug_assertions)]
                if PRINT_PRUNE_EVENTS {
                    log::debug!(
                        "Series {} abandoned at offset {} (distance {:.5} > {:.5})",
                        series_index,
                        offset,
                        distance,
                        self.thresholds.divergence
                    );
                }
                break;
            }

            if distance > self.thresholds.weak_match {
                skip_remaining = self.thresholds.skip_len;
            }

            scan.candidates
                .push(Candidate::new(distance, series_index, offset));
        }

        scan
    }

    /// Scan the contiguous block of corpus files `files` for worker `worker_id`.
    /// Unreadable files are logged and skipped; progress advances once per file either way.
    pub fn scan_partition(
        &self,
        source: &dyn SeriesSource,
        names: &[String],
        files: Range<usize>,
        worker_id: usize,
        progress: &ProgressTracker,
    ) -> PartitionScan {
        let mut report = PartitionScan::empty(worker_id, files.clone());

        for series_index in files {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let Some(name) = names.get(series_index) else {
                log::error!(
                    "Worker {}: file index {} is outside the corpus ({} files)",
                    worker_id,
                    series_index,
                    names.len()
                );
                progress.increment(worker_id);
                report.files_failed += 1;
                continue;
            };

            match source.read_closes(name) {
                Ok(closes) => {
                    let scan = self.scan_series(series_index, &closes);
                    report.absorb(scan);
                }
                Err(e) => {
                    log::warn!("Worker {}: skipping {}: {}", worker_id, name, e);
                    report.files_failed += 1;
                }
            }
            progress.increment(worker_id);
        }

        if self.cancel.is_cancelled() {
            report.cancelled = true;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SEARCH;
    use crate::data::InMemorySeries;

    fn scanner(query: Vec<f64>, horizon: usize) -> CorpusScanner {
        let query = QueryWindow::from_normalized(query).unwrap();
        let thresholds = PruneThresholds::for_window(query.len(), &SEARCH.prune);
        CorpusScanner::new(Arc::new(query), horizon, thresholds, CancelToken::new())
    }

    /// Ten-point query on a gentle ramp; thresholds are 0.2 (divergence), 0.005 (weak), skip 2.
    fn ramp_query() -> Vec<f64> {
        (0..10).map(|i| 0.991 + 0.001 * i as f64).collect()
    }

    #[test]
    fn test_thresholds_scale_with_window() {
        let t = PruneThresholds::for_window(10, &SEARCH.prune);
        assert!((t.divergence - 0.2).abs() < 1e-12);
        assert!((t.weak_match - 0.005).abs() < 1e-12);
        assert_eq!(t.skip_len, 2);

        let short = PruneThresholds::for_window(3, &SEARCH.prune);
        assert_eq!(short.skip_len, 0);
    }

    #[test]
    fn test_strong_matches_are_all_recorded() {
        let s = scanner(ramp_query(), 2);
        // The same ramp shape everywhere: a price series growing geometrically matches
        // the query shape closely at every offset
        let closes: Vec<f64> = (0..30).map(|i| 100.0 * (1.0 + 0.001 * i as f64)).collect();
        let scan = s.scan_series(4, &closes);

        assert_eq!(scan.offsets_examined, 30 - 10 - 2 + 1);
        assert_eq!(scan.offsets_scored, scan.offsets_examined);
        assert_eq!(scan.candidates.len(), scan.offsets_examined);
        assert!(scan.diverged_at.is_none());
        assert!(scan.candidates.iter().all(|c| c.series_index == 4));
    }

    #[test]
    fn test_divergence_stops_the_series() {
        let s = scanner(ramp_query(), 1);
        let mut closes: Vec<f64> = (0..10).map(|i| 0.991 + 0.001 * i as f64).collect();
        // Offset 1 onwards includes a wild spike, which diverges immediately
        closes.push(5.0);
        closes.extend((0..20).map(|i| 0.991 + 0.001 * (i % 10) as f64));

        let scan = s.scan_series(0, &closes);

        assert_eq!(scan.diverged_at, Some(1));
        assert_eq!(scan.offsets_scored, 2);
        assert_eq!(scan.candidates.len(), 1);
        assert_eq!(scan.candidates[0].offset, 0);
        // No candidate from any later offset of the same series
        assert!(scan.candidates.iter().all(|c| c.offset < 1));
    }

    #[test]
    fn test_weak_match_skips_following_offsets() {
        let s = scanner(ramp_query(), 1);
        // Flat series: distance to the ramp is about 0.017, weak but not divergent
        let closes = vec![50.0; 20];
        let scan = s.scan_series(0, &closes);

        let offsets: Vec<usize> = scan.candidates.iter().map(|c| c.offset).collect();
        // Last offset is 20 - 10 - 1 = 9; scoring happens every third offset
        assert_eq!(offsets, vec![0, 3, 6, 9]);
        assert_eq!(scan.offsets_examined, 10);
        assert_eq!(scan.offsets_scored, 4);

        let skip = s.thresholds().skip_len;
        for pair in offsets.windows(2) {
            assert!(pair[1] > pair[0] + skip);
        }
    }

    #[test]
    fn test_short_series_yield_nothing() {
        let s = scanner(ramp_query(), 5);
        let scan = s.scan_series(0, &[1.0; 14]);
        assert_eq!(scan, SeriesScan::default());
    }

    #[test]
    fn test_end_to_end_offsets_include_last_valid() {
        let s = scanner(vec![0.98, 0.99, 1.0], 2);
        let closes = [10.0, 10.5, 10.3, 10.4, 10.2, 10.6, 10.8];
        let scan = s.scan_series(0, &closes);

        let offsets: Vec<usize> = scan.candidates.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
        assert!((scan.candidates[2].distance - 0.042010690497886).abs() < 1e-9);
    }

    #[test]
    fn test_partition_counts_progress_per_file() {
        let s = scanner(vec![0.98, 0.99, 1.0], 2);
        let source = InMemorySeries::new()
            .with_series("a", vec![10.0, 10.5, 10.3, 10.4, 10.2, 10.6, 10.8])
            .with_series("b", vec![1.0, 2.0])
            .with_series("c", vec![49.0, 49.5, 50.0, 50.5, 51.0]);
        let mut names = source.list_series().unwrap();
        names.insert(1, "missing".to_string());

        let progress = ProgressTracker::new(2, 4);
        let report = s.scan_partition(&source, &names, 0..4, 1, &progress);

        assert_eq!(progress.worker_completed(1), 4);
        assert_eq!(progress.worker_completed(0), 0);
        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.files_failed, 1);
        // Three from "a", one from "c"; "b" is too short
        assert_eq!(report.candidates.len(), 4);
        assert!(report.candidates.iter().any(|c| c.series_index == 3));
    }

    #[test]
    fn test_cancelled_scan_stops_early() {
        let s = scanner(vec![0.98, 0.99, 1.0], 2);
        s.cancel.cancel();
        let source = InMemorySeries::new().with_series("a", vec![1.0; 50]);
        let names = source.list_series().unwrap();
        let progress = ProgressTracker::new(1, 1);

        let report = s.scan_partition(&source, &names, 0..1, 0, &progress);
        assert!(report.cancelled);
        assert!(report.candidates.is_empty());
        assert_eq!(progress.completed(), 0);
    }
}
