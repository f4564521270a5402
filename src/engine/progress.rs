use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[cfg(debug_assertions)]
use crate::config::debug::PRINT_PROGRESS;

/// Anything that wants fraction-complete updates during a search.
/// Only ever called from the coordinating thread.
pub trait ProgressSink {
    fn report(&self, fraction: f64);
}

impl<F: Fn(f64)> ProgressSink for F {
    fn report(&self, fraction: f64) {
        self(fraction)
    }
}

/// Discards all updates.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f64) {}
}

/// Logs whole-percent progress at info level.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, fraction: f64) {
        log::info!("Search progress: {:.0}%", fraction * 100.0);
    }
}

/// One counter per worker. Each slot has a single writer (its worker);
/// the coordinator only reads.
pub struct ProgressTracker {
    slots: Vec<AtomicU64>,
    total: u64,
}

impl ProgressTracker {
    pub fn new(workers: usize, total: usize) -> Self {
        Self {
            slots: (0..workers).map(|_| AtomicU64::new(0)).collect(),
            total: total as u64,
        }
    }

    #[inline]
    pub fn increment(&self, worker_id: usize) {
        if let Some(slot) = self.slots.get(worker_id) {
            slot.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Raise a worker's slot to `units` without ever moving it backwards.
    pub fn complete_worker(&self, worker_id: usize, units: usize) {
        if let Some(slot) = self.slots.get(worker_id) {
            slot.fetch_max(units as u64, Ordering::Relaxed);
        }
    }

    pub fn worker_completed(&self, worker_id: usize) -> u64 {
        self.slots
            .get(worker_id)
            .map(|s| s.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn completed(&self) -> u64 {
        self.slots.iter().map(|s| s.load(Ordering::Relaxed)).sum()
    }

    /// `completed / total`, clamped to [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed() as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// Rate limiter between the tracker and a sink: reports only when the aggregate
/// changed and at least `interval` has passed since the previous report.
pub struct ProgressThrottle {
    interval: Duration,
    last_completed: u64,
    last_report: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_completed: 0,
            last_report: None,
        }
    }

    /// Returns true if the sink was called.
    pub fn poll(&mut self, tracker: &ProgressTracker, sink: &dyn ProgressSink) -> bool {
        let completed = tracker.completed();
        if completed == self.last_completed {
            return false;
        }
        if let Some(last) = self.last_report
            && last.elapsed() < self.interval
        {
            return false;
        }
        self.emit(completed, tracker, sink);
        true
    }

    /// Final report once all workers joined, bypassing the interval.
    pub fn finish(&mut self, tracker: &ProgressTracker, sink: &dyn ProgressSink) {
        let completed = tracker.completed();
        if completed != self.last_completed {
            self.emit(completed, tracker, sink);
        }
    }

    fn emit(&mut self, completed: u64, tracker: &ProgressTracker, sink: &dyn ProgressSink) {
        let fraction = tracker.fraction();

        #[cfg(debug_assertions)]
        if PRINT_PROGRESS {
            log::debug!("Progress {} units ({:.3})", completed, fraction);
        }

        sink.report(fraction);
        self.last_completed = completed;
        self.last_report = Some(Instant::now());
    }
}

/// Shared stop flag. Scanners check it between offsets and between files.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Clear the flag so the owner can run again.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_tracker_sums_slots() {
        let tracker = ProgressTracker::new(3, 10);
        tracker.increment(0);
        tracker.increment(2);
        tracker.increment(2);
        tracker.increment(7); // out of range, ignored

        assert_eq!(tracker.completed(), 3);
        assert_eq!(tracker.worker_completed(2), 2);
        assert!((tracker.fraction() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_complete_worker_never_moves_backwards() {
        let tracker = ProgressTracker::new(2, 6);
        tracker.increment(1);
        tracker.complete_worker(1, 3);
        assert_eq!(tracker.worker_completed(1), 3);

        tracker.complete_worker(1, 2);
        assert_eq!(tracker.worker_completed(1), 3);
        assert_eq!(tracker.worker_completed(0), 0);
    }

    #[test]
    fn test_fraction_is_clamped() {
        let tracker = ProgressTracker::new(1, 2);
        for _ in 0..5 {
            tracker.increment(0);
        }
        assert_eq!(tracker.fraction(), 1.0);
    }

    #[test]
    fn test_throttle_reports_only_changes() {
        let tracker = ProgressTracker::new(1, 4);
        let seen = RefCell::new(Vec::new());
        let sink = |f: f64| seen.borrow_mut().push(f);
        let mut throttle = ProgressThrottle::new(Duration::ZERO);

        assert!(!throttle.poll(&tracker, &sink));
        tracker.increment(0);
        assert!(throttle.poll(&tracker, &sink));
        assert!(!throttle.poll(&tracker, &sink));
        tracker.increment(0);
        throttle.finish(&tracker, &sink);
        throttle.finish(&tracker, &sink);

        assert_eq!(*seen.borrow(), vec![0.25, 0.5]);
    }

    #[test]
    fn test_throttle_respects_interval() {
        let tracker = ProgressTracker::new(1, 4);
        let count = RefCell::new(0);
        let sink = |_: f64| *count.borrow_mut() += 1;
        let mut throttle = ProgressThrottle::new(Duration::from_secs(3600));

        tracker.increment(0);
        assert!(throttle.poll(&tracker, &sink));
        tracker.increment(0);
        assert!(!throttle.poll(&tracker, &sink));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        clone.reset();
        assert!(!token.is_cancelled());
    }
}
