// Similarity search: scoring, scanning, ranking, and reconstruction
pub mod ranker;
pub mod reconstruct;
pub mod scanner;
pub mod similarity;

// Re-export commonly used types
pub use ranker::rank_top_k;
pub use reconstruct::Reconstructor;
pub use scanner::{CorpusScanner, PruneThresholds, SeriesScan};
pub use similarity::score;
