//! Corpus location and file format configuration

/// Where the historical corpus lives and how its files are laid out
pub struct CorpusFiles {
    /// Directory holding one CSV file per historical series
    pub directory: &'static str,
    /// Header of the closing-price column (matched case-insensitively)
    pub close_column: &'static str,
    /// Extension written by the demo corpus helper
    pub extension: &'static str,
}

/// Shape of the synthetic corpus written by `make_demo_corpus`
pub struct DemoCorpus {
    pub series_count: usize,
    pub series_len: usize,
    pub start_price: f64,
}

pub struct PersistenceConfig {
    pub corpus: CorpusFiles,
    pub demo: DemoCorpus,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    corpus: CorpusFiles {
        directory: "corpus_data",
        close_column: "Close",
        extension: "csv",
    },
    demo: DemoCorpus {
        series_count: 64,
        series_len: 2_000,
        start_price: 100.0,
    },
};

/// Filename for the n-th demo series, zero padded so name order matches index order
/// Example: "series_0007.csv"
pub fn demo_series_filename(index: usize) -> String {
    format!("series_{:04}.{}", index, PERSISTENCE.corpus.extension)
}
