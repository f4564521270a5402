//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so release
//! builds remain quiet. They are further gated by `cfg(debug_assertions)`.

/// Emit a per-worker summary (files, offsets, candidates, elapsed) when a scan finishes.
pub const PRINT_WORKER_SUMMARY: bool = false;

/// Emit a line every time the divergence stop abandons a series.
pub const PRINT_PRUNE_EVENTS: bool = false;

/// Emit details for every reconstructed prediction path.
pub const PRINT_RECONSTRUCTION: bool = false;

/// Emit a line for every series file read from disk.
pub const PRINT_SERIES_READS: bool = false;

/// Emit every progress fraction reported to the sink.
pub const PRINT_PROGRESS: bool = false;
