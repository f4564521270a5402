use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::thread;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::analysis::{CorpusScanner, PruneThresholds, Reconstructor, rank_top_k};
use crate::config::{PruneSettings, SEARCH};
use crate::data::{CsvSeriesStore, SeriesSource};
use crate::domain::{QueryWindow, ResultMatrix};
use crate::error::{Result, SearchError};

use super::messages::{PartitionScan, SearchOutcome, SearchStats};
use super::progress::{CancelToken, ProgressSink, ProgressThrottle, ProgressTracker};
use super::worker;

/// How the corpus sample budget is split across workers.
/// Worker `w` scans file indices `[w * per_worker, (w + 1) * per_worker)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub window_len: usize,
    pub horizon: usize,
    pub data_size: usize,
    pub workers: usize,
    pub per_worker: usize,
}

impl SearchPlan {
    pub fn new(
        window_len: usize,
        horizon: usize,
        data_size: usize,
        workers: usize,
        available_files: usize,
    ) -> Result<Self> {
        if window_len < SEARCH.min_window_len {
            return Err(SearchError::InvalidParams(format!(
                "window length {} is below the minimum of {}",
                window_len, SEARCH.min_window_len
            )));
        }
        if horizon == 0 {
            return Err(SearchError::InvalidParams(
                "horizon must be at least 1".to_string(),
            ));
        }
        if workers == 0 {
            return Err(SearchError::InvalidParams(
                "worker count must be at least 1".to_string(),
            ));
        }
        if data_size == 0 {
            return Err(SearchError::InvalidParams(
                "data size must be at least 1".to_string(),
            ));
        }
        if data_size > available_files {
            return Err(SearchError::InsufficientCorpus {
                requested: data_size,
                available: available_files,
            });
        }

        let per_worker = data_size / workers;
        if per_worker == 0 {
            return Err(SearchError::InvalidParams(format!(
                "data size {} cannot give each of {} workers a file",
                data_size, workers
            )));
        }

        Ok(Self {
            window_len,
            horizon,
            data_size,
            workers,
            per_worker,
        })
    }

    pub fn partition(&self, worker_id: usize) -> Range<usize> {
        let start = worker_id * self.per_worker;
        start..start + self.per_worker
    }

    pub fn partitions(&self) -> Vec<(usize, Range<usize>)> {
        (0..self.workers).map(|w| (w, self.partition(w))).collect()
    }

    /// Files actually assigned to a worker.
    pub fn scanned_files(&self) -> usize {
        self.per_worker * self.workers
    }

    /// Remainder of the integer split, left unscanned.
    pub fn dropped_files(&self) -> usize {
        self.data_size - self.scanned_files()
    }
}

pub fn available_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// The parallel coordinator. Owns the query and corpus handle for one or more searches.
pub struct SearchEngine {
    query: Arc<QueryWindow>,
    source: Arc<dyn SeriesSource>,
    horizon: usize,
    data_size: Option<usize>,
    workers: usize,
    top_k: usize,
    prune: PruneSettings,
    progress_interval: Duration,
    cancel: CancelToken,
}

impl SearchEngine {
    /// Defaults: horizon from the query length, the whole corpus, one worker per core.
    pub fn new(query: QueryWindow, source: Arc<dyn SeriesSource>) -> Self {
        let horizon = query.default_horizon();
        Self {
            query: Arc::new(query),
            source,
            horizon,
            data_size: None,
            workers: available_workers(),
            top_k: SEARCH.top_k,
            prune: SEARCH.prune,
            progress_interval: Duration::from_millis(SEARCH.progress_interval_ms),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Number of corpus files to sample. Defaults to every file listed.
    pub fn with_data_size(mut self, data_size: usize) -> Self {
        self.data_size = Some(data_size);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_prune(mut self, prune: PruneSettings) -> Self {
        self.prune = prune;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Handle for stopping a running search from another thread.
    /// The flag is cleared when that search returns, so the engine can search again.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn query(&self) -> &QueryWindow {
        &self.query
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Always returns a matrix; anything that stops the search is logged and yields an
    /// empty one.
    pub fn search(&self, progress: &dyn ProgressSink) -> ResultMatrix {
        match self.try_search(progress) {
            Ok(outcome) => outcome.matrix,
            Err(e) => {
                log::error!("Search aborted: {}", e);
                ResultMatrix::empty(self.query.len(), self.horizon)
            }
        }
    }

    pub fn try_search(&self, progress: &dyn ProgressSink) -> Result<SearchOutcome> {
        let outcome = self.run_search(progress);
        self.cancel.reset();
        outcome
    }

    fn run_search(&self, progress: &dyn ProgressSink) -> Result<SearchOutcome> {
        let start = Instant::now();

        let names = self.source.list_series()?;
        let data_size = self.data_size.unwrap_or(names.len());
        let plan = SearchPlan::new(
            self.query.len(),
            self.horizon,
            data_size,
            self.workers,
            names.len(),
        )?;

        log::info!(
            "Searching {} of {} series ({}) with {} workers, window {}, horizon {}",
            plan.data_size,
            names.len(),
            self.source.signature(),
            plan.workers,
            plan.window_len,
            plan.horizon
        );
        if plan.dropped_files() > 0 {
            log::warn!(
                "{} of {} files fall outside the {} x {} partitions and will not be scanned",
                plan.dropped_files(),
                plan.data_size,
                plan.workers,
                plan.per_worker
            );
        }

        let reports = self.run_workers(&plan, &names, progress)?;

        let mut stats = SearchStats {
            workers: plan.workers,
            files_per_worker: plan.per_worker,
            ..Default::default()
        };
        let mut candidates = Vec::new();
        for report in reports {
            stats.absorb(&report);
            if report.files_scanned + report.files_failed == 0
                && !report.files.is_empty()
                && !report.cancelled
            {
                stats.workers_failed += 1;
            }
            candidates.extend(report.candidates);
        }

        let matrix = if candidates.is_empty() {
            log::info!("No candidate matched the query");
            ResultMatrix::empty(plan.window_len, plan.horizon)
        } else {
            let selected = rank_top_k(candidates, self.top_k);
            let mut reconstructor = Reconstructor::new(self.source.as_ref(), &names);
            reconstructor.reconstruct(&self.query, plan.horizon, &selected)
        };

        stats.paths = matrix.len();
        stats.duration_ms = start.elapsed().as_millis();
        log::info!(
            "Search finished in {}ms: {} candidates, {} paths, {} files failed{}",
            stats.duration_ms,
            stats.candidates,
            stats.paths,
            stats.files_failed,
            if stats.cancelled { " (cancelled)" } else { "" }
        );

        Ok(SearchOutcome { matrix, stats })
    }

    /// Fan out one scanner per partition on a dedicated pool, poll progress from this
    /// thread until every worker has joined.
    fn run_workers(
        &self,
        plan: &SearchPlan,
        names: &[String],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<PartitionScan>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(plan.workers)
            .thread_name(|i| format!("analog-scan-{i}"))
            .build()
            .map_err(|e| SearchError::WorkerPool(e.to_string()))?;

        let thresholds = PruneThresholds::for_window(plan.window_len, &self.prune);
        let scanner = CorpusScanner::new(
            Arc::clone(&self.query),
            plan.horizon,
            thresholds,
            self.cancel.clone(),
        );
        let tracker = ProgressTracker::new(plan.workers, plan.scanned_files());
        let source = self.source.as_ref();
        let partitions = plan.partitions();

        let mut throttle = ProgressThrottle::new(self.progress_interval);
        let (done_tx, done_rx) = channel::<()>();

        let joined = thread::scope(|s| {
            let scanner = &scanner;
            let tracker = &tracker;
            let pool = &pool;

            let handle = s.spawn(move || {
                let reports: Vec<PartitionScan> = pool.install(|| {
                    partitions
                        .into_par_iter()
                        .map(|(worker_id, files)| {
                            worker::run_partition(scanner, source, names, worker_id, files, tracker)
                        })
                        .collect()
                });
                // Receiver may already be gone if the coordinator bailed; nothing to do then
                let _ = done_tx.send(());
                reports
            });

            loop {
                match done_rx.recv_timeout(self.progress_interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        throttle.poll(tracker, progress);
                    }
                }
            }

            handle.join()
        });

        throttle.finish(&tracker, progress);

        joined.map_err(|_| SearchError::WorkerPool("worker pool panicked".to_string()))
    }
}

/// One-shot search over a directory of CSV series.
///
/// `query` must already be normalized (last value 1.0) and have length `window_len`.
/// Runs one worker per core, capped at `data_size`. Never fails: invalid input, an
/// unreadable corpus, or no matches all give an empty matrix, with the reason in the logs.
pub fn search(
    query: &[f64],
    window_len: usize,
    horizon: usize,
    data_size: usize,
    corpus_path: &Path,
    progress: &dyn ProgressSink,
) -> ResultMatrix {
    if query.len() != window_len {
        log::error!(
            "Query has {} values but window length is {}",
            query.len(),
            window_len
        );
        return ResultMatrix::empty(window_len, horizon);
    }
    let query = match QueryWindow::from_normalized(query.to_vec()) {
        Ok(q) => q,
        Err(e) => {
            log::error!("Rejected query: {}", e);
            return ResultMatrix::empty(window_len, horizon);
        }
    };

    // Small samples get fewer workers so every worker still has a file
    let workers = available_workers().min(data_size).max(1);

    SearchEngine::new(query, Arc::new(CsvSeriesStore::new(corpus_path)))
        .with_horizon(horizon)
        .with_data_size(data_size)
        .with_workers(workers)
        .search(progress)
}
