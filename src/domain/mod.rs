// Domain types and value objects
pub mod candidate;
pub mod prediction;
pub mod query;

// Re-export commonly used types
pub use candidate::Candidate;
pub use prediction::{FinalMoveStats, PredictionPath, ResultMatrix};
pub use query::QueryWindow;
