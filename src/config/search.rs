//! Search and pruning configuration

/// Thresholds for the adaptive early exit in the corpus scanner.
/// All three scale with the query window length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruneSettings {
    // A window further than `window_len / divergence_divisor` from the query ends the series scan
    pub divergence_divisor: f64,
    // Windows further than `window_len / weak_match_divisor * weak_match_factor` are weak matches
    pub weak_match_divisor: f64,
    pub weak_match_factor: f64,
    // After a weak match, skip `window_len / skip_divisor` offsets without scoring them
    pub skip_divisor: usize,
}

/// The Master Search Configuration
pub struct SearchConfig {
    // Number of best candidates kept for reconstruction
    pub top_k: usize,
    // Minimum delay between two progress callbacks (milliseconds)
    pub progress_interval_ms: u64,
    // Default horizon is query length / horizon_divisor (the acquisition layer predicts 20% ahead)
    pub horizon_divisor: usize,
    // Tolerance when checking that a normalized query ends at 1.0
    pub anchor_tolerance: f64,
    // Smallest query window we accept
    pub min_window_len: usize,

    // Sub-groups
    pub prune: PruneSettings,
}

pub const SEARCH: SearchConfig = SearchConfig {
    top_k: 100,
    progress_interval_ms: 100,
    horizon_divisor: 5,
    anchor_tolerance: 1e-9,
    min_window_len: 2,

    prune: PruneSettings {
        divergence_divisor: 50.0,
        weak_match_divisor: 1000.0,
        weak_match_factor: 0.5,
        skip_divisor: 5,
    },
};
