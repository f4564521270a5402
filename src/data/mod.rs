// Corpus access and query loading
pub mod query_file;
pub mod series_store;

// Re-export commonly used types
pub use query_file::load_query_csv;
pub use series_store::{CsvSeriesStore, InMemorySeries, SeriesSource};
