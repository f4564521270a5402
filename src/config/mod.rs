//! Configuration module for the analog scanner.

pub mod persistence;
pub mod search;

pub mod debug; // Flags are referenced as crate::config::debug::PRINT_*

// Re-export commonly used items
pub use persistence::{PERSISTENCE, demo_series_filename};
pub use search::{PruneSettings, SEARCH};
