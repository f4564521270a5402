pub mod core;
pub mod messages;
pub mod progress;
pub mod worker;

// Re-export key components
pub use core::{SearchEngine, SearchPlan, available_workers, search};
pub use messages::{PartitionScan, SearchOutcome, SearchStats};
pub use progress::{CancelToken, LogProgress, NoProgress, ProgressSink, ProgressTracker};
