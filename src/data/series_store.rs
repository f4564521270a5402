use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::config::PERSISTENCE;
#[cfg(debug_assertions)]
use crate::config::debug::PRINT_SERIES_READS;
use crate::error::SeriesError;

/// Read access to an ordered corpus of named closing-price series.
/// Implementations must list names in a stable order: series indices are positions in it.
pub trait SeriesSource: Send + Sync {
    fn list_series(&self) -> Result<Vec<String>, SeriesError>;

    fn read_closes(&self, name: &str) -> Result<Vec<f64>, SeriesError>;

    /// A unique identifier for this implementation (for logs).
    fn signature(&self) -> &'static str;
}

/// A directory of CSV files, one series per file, each with a `Close` column.
#[derive(Debug, Clone)]
pub struct CsvSeriesStore {
    root: PathBuf,
}

impl CsvSeriesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn default_location() -> Self {
        Self::new(PERSISTENCE.corpus.directory)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn io_error(path: &Path, source: io::Error) -> SeriesError {
    if source.kind() == io::ErrorKind::NotFound {
        SeriesError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        SeriesError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SeriesSource for CsvSeriesStore {
    fn list_series(&self) -> Result<Vec<String>, SeriesError> {
        let entries = fs::read_dir(&self.root).map_err(|e| io_error(&self.root, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&self.root, e))?;
            let is_file = entry
                .file_type()
                .map(|t| t.is_file())
                .map_err(|e| io_error(&entry.path(), e))?;
            if is_file {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        // read_dir order is platform dependent; partitions must not be
        names.sort();
        Ok(names)
    }

    fn read_closes(&self, name: &str) -> Result<Vec<f64>, SeriesError> {
        let path = self.root.join(name);
        let file = File::open(&path).map_err(|e| io_error(&path, e))?;
        let closes = parse_close_column(name, BufReader::new(file))?;

        #[cfg(debug_assertions)]
        if PRINT_SERIES_READS {
            log::debug!("Read {} closes from {}", closes.len(), path.display());
        }
        Ok(closes)
    }

    fn signature(&self) -> &'static str {
        "CSV Directory"
    }
}

/// Pull the close column out of a CSV stream with a header row.
pub fn parse_close_column<R: io::Read>(name: &str, reader: R) -> Result<Vec<f64>, SeriesError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| SeriesError::malformed(name, format!("unreadable header: {e}")))?;
    let close_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(PERSISTENCE.corpus.close_column))
        .ok_or_else(|| {
            SeriesError::malformed(
                name,
                format!("no '{}' column", PERSISTENCE.corpus.close_column),
            )
        })?;

    let mut closes = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record =
            record.map_err(|e| SeriesError::malformed(name, format!("row {row}: {e}")))?;
        let cell = record
            .get(close_idx)
            .ok_or_else(|| SeriesError::malformed(name, format!("row {row}: missing close")))?;
        let value: f64 = cell
            .parse()
            .map_err(|_| SeriesError::malformed(name, format!("row {row}: bad close '{cell}'")))?;
        if !value.is_finite() {
            return Err(SeriesError::malformed(
                name,
                format!("row {row}: close is not finite"),
            ));
        }
        closes.push(value);
    }

    Ok(closes)
}

/// Corpus held in memory. Names keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeries {
    series: Vec<(String, Vec<f64>)>,
}

impl InMemorySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, name: impl Into<String>, closes: Vec<f64>) -> Self {
        self.series.push((name.into(), closes));
        self
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl SeriesSource for InMemorySeries {
    fn list_series(&self) -> Result<Vec<String>, SeriesError> {
        Ok(self.series.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read_closes(&self, name: &str) -> Result<Vec<f64>, SeriesError> {
        self.series
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, closes)| closes.clone())
            .ok_or_else(|| SeriesError::NotFound {
                path: PathBuf::from(name),
            })
    }

    fn signature(&self) -> &'static str {
        "In Memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_lists_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.csv", "Close\n1\n");
        write_file(dir.path(), "a.csv", "Close\n1\n");
        fs::create_dir(dir.path().join("nested")).unwrap();

        let store = CsvSeriesStore::new(dir.path());
        assert_eq!(store.list_series().unwrap(), vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvSeriesStore::new(dir.path().join("nope"));
        assert!(matches!(
            store.list_series(),
            Err(SeriesError::NotFound { .. })
        ));
        assert!(matches!(
            store.read_closes("x.csv"),
            Err(SeriesError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reads_close_column_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "s.csv",
            "Date,Open, close ,Volume\n2024-01-01,1,10.5,3\n2024-01-02,1,10.25,3\n",
        );

        let store = CsvSeriesStore::new(dir.path());
        assert_eq!(store.read_closes("s.csv").unwrap(), vec![10.5, 10.25]);
    }

    #[test]
    fn test_malformed_rows() {
        let no_column = parse_close_column("x", "Open\n1\n".as_bytes());
        assert!(matches!(no_column, Err(SeriesError::Malformed { .. })));

        let bad_value = parse_close_column("x", "Close\n1\nabc\n".as_bytes());
        assert!(matches!(bad_value, Err(SeriesError::Malformed { .. })));

        let empty_cell = parse_close_column("x", "Date,Close\nd,\n".as_bytes());
        assert!(matches!(empty_cell, Err(SeriesError::Malformed { .. })));

        let nan = parse_close_column("x", "Close\nNaN\n".as_bytes());
        assert!(matches!(nan, Err(SeriesError::Malformed { .. })));
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemorySeries::new()
            .with_series("one", vec![1.0, 2.0])
            .with_series("two", vec![3.0]);

        assert_eq!(source.list_series().unwrap(), vec!["one", "two"]);
        assert_eq!(source.read_closes("two").unwrap(), vec![3.0]);
        assert!(source.read_closes("three").is_err());
    }
}
