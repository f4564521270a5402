// Loads a query window from a local CSV export. Downloading and retrying live data
// happens outside this crate; this is the offline stand-in used by the CLI.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};

use crate::data::series_store::parse_close_column;
use crate::domain::QueryWindow;

/// Read the close column of `path`, keep the last `keep_last` values if asked,
/// and normalize so the window ends at 1.0.
pub fn load_query_csv(path: &Path, keep_last: Option<usize>) -> Result<QueryWindow> {
    let file = File::open(path).context(format!("Failed to open query file: {:?}", path))?;
    let name = path.display().to_string();
    let mut closes = parse_close_column(&name, BufReader::new(file))
        .context(format!("Failed to parse query file: {:?}", path))?;

    if let Some(n) = keep_last {
        let start = closes.len().saturating_sub(n);
        closes.drain(..start);
    }

    let query = QueryWindow::from_raw_closes(&closes)
        .context(format!("Query file {:?} is not a usable window", path))?;
    log::info!("Loaded query window of {} values from {:?}", query.len(), path);
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_and_trim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Date,Close").unwrap();
        for (i, close) in [7.0, 8.0, 49.0, 49.5, 50.0].iter().enumerate() {
            writeln!(file, "d{i},{close}").unwrap();
        }
        drop(file);

        let query = load_query_csv(&path, Some(3)).unwrap();
        assert_eq!(query.len(), 3);
        assert!((query.values()[0] - 0.98).abs() < 1e-12);
        assert_eq!(query.last(), 1.0);

        let full = load_query_csv(&path, None).unwrap();
        assert_eq!(full.len(), 5);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_query_csv(&dir.path().join("none.csv"), None).is_err());
    }
}
