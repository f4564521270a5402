use std::collections::HashMap;
use std::sync::Arc;

#[cfg(debug_assertions)]
use crate::config::debug::PRINT_RECONSTRUCTION;
use crate::data::SeriesSource;
use crate::domain::{Candidate, PredictionPath, QueryWindow, ResultMatrix};
use crate::error::{ReconstructError, SeriesError};
use crate::utils::scale;

/// Expands ranked candidates into prediction paths by re-reading their series.
/// Each series is read at most once per reconstructor.
pub struct Reconstructor<'a> {
    source: &'a dyn SeriesSource,
    names: &'a [String],
    cache: HashMap<usize, Arc<Vec<f64>>>,
}

impl<'a> Reconstructor<'a> {
    pub fn new(source: &'a dyn SeriesSource, names: &'a [String]) -> Self {
        Self {
            source,
            names,
            cache: HashMap::new(),
        }
    }

    /// Build the result matrix in rank order. Candidates that cannot be reconstructed
    /// are logged and dropped; the rest keep their relative order.
    pub fn reconstruct(
        &mut self,
        query: &QueryWindow,
        horizon: usize,
        selected: &[Candidate],
    ) -> ResultMatrix {
        let mut matrix = ResultMatrix::empty(query.len(), horizon);

        for candidate in selected {
            let path = match self.build_path(query, horizon, candidate) {
                Ok(path) => path,
                Err(e) => {
                    log::warn!(
                        "Dropping candidate (series {}, offset {}): {}",
                        candidate.series_index,
                        candidate.offset,
                        e
                    );
                    continue;
                }
            };

            let expected = matrix.path_len();
            if let Err(rejected) = matrix.push(path) {
                log::error!(
                    "{}",
                    ReconstructError::SizeMismatch {
                        expected,
                        actual: rejected.values.len(),
                    }
                );
            }
        }

        matrix
    }

    /// Slice `[offset, offset + window_len + horizon)` and rescale it so the value at
    /// `window_len - 1` equals the query's last value.
    pub fn build_path(
        &mut self,
        query: &QueryWindow,
        horizon: usize,
        candidate: &Candidate,
    ) -> Result<PredictionPath, ReconstructError> {
        let window_len = query.len();
        let needed = window_len + horizon;
        let names = self.names;
        let name = names
            .get(candidate.series_index)
            .ok_or_else(|| SeriesError::NotFound {
                path: format!("series #{}", candidate.series_index).into(),
            })?;
        let closes = self.closes(candidate.series_index, name)?;

        let end = candidate.offset + needed;
        if end > closes.len() {
            return Err(ReconstructError::InsufficientData {
                series_index: candidate.series_index,
                offset: candidate.offset,
                needed,
                available: closes.len().saturating_sub(candidate.offset),
            });
        }
        let segment = &closes[candidate.offset..end];

        let anchor = segment[window_len - 1];
        if anchor == 0.0 || !anchor.is_finite() {
            return Err(SeriesError::malformed(
                name.as_str(),
                format!("anchor at offset {} is {}", candidate.offset, anchor),
            )
            .into());
        }

        let mut values = scale(segment, query.last() / anchor);
        // Pin the anchor exactly; x * (1 / x) is not always 1.0 in floating point
        values[window_len - 1] = query.last();

        if values.len() != needed {
            return Err(ReconstructError::SizeMismatch {
                expected: needed,
                actual: values.len(),
            });
        }

        #[cfg(debug_assertions)]
        if PRINT_RECONSTRUCTION {
            log::debug!(
                "Path from {} @ {} (distance {:.5}): final {:.5}",
                name,
                candidate.offset,
                candidate.distance,
                values[values.len() - 1]
            );
        }

        Ok(PredictionPath {
            series_index: candidate.series_index,
            series_name: name.clone(),
            offset: candidate.offset,
            distance: candidate.distance,
            values,
        })
    }

    fn closes(&mut self, series_index: usize, name: &str) -> Result<Arc<Vec<f64>>, SeriesError> {
        if let Some(closes) = self.cache.get(&series_index) {
            return Ok(Arc::clone(closes));
        }
        let closes = Arc::new(self.source.read_closes(name)?);
        self.cache.insert(series_index, Arc::clone(&closes));
        Ok(closes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemorySeries;

    fn setup() -> (InMemorySeries, Vec<String>, QueryWindow) {
        let source = InMemorySeries::new()
            .with_series("a", vec![10.0, 10.5, 10.3, 10.4, 10.2, 10.6, 10.8])
            .with_series("zero", vec![1.0, 1.0, 0.0, 1.0, 1.0]);
        let names = source.list_series().unwrap();
        let query = QueryWindow::from_normalized(vec![0.98, 0.99, 1.0]).unwrap();
        (source, names, query)
    }

    #[test]
    fn test_path_is_anchored_and_scaled() {
        let (source, names, query) = setup();
        let mut r = Reconstructor::new(&source, &names);

        let path = r
            .build_path(&query, 2, &Candidate::new(0.04, 0, 2))
            .unwrap();

        assert_eq!(path.values.len(), 5);
        assert_eq!(path.values[2], 1.0);
        let expected = [10.3, 10.4, 10.2, 10.6, 10.8].map(|v| v / 10.2);
        for (got, want) in path.values.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(path.series_name, "a");
    }

    #[test]
    fn test_insufficient_data() {
        let (source, names, query) = setup();
        let mut r = Reconstructor::new(&source, &names);

        let err = r
            .build_path(&query, 2, &Candidate::new(0.0, 0, 3))
            .unwrap_err();
        assert!(matches!(
            err,
            ReconstructError::InsufficientData {
                needed: 5,
                available: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_candidates_are_dropped() {
        let (source, names, query) = setup();
        let mut r = Reconstructor::new(&source, &names);
        let selected = [
            Candidate::new(0.01, 0, 1),
            Candidate::new(0.02, 1, 0), // zero anchor
            Candidate::new(0.03, 7, 0), // unknown series
            Candidate::new(0.04, 0, 5), // runs off the end
            Candidate::new(0.05, 0, 0),
        ];

        let matrix = r.reconstruct(&query, 2, &selected);

        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.rank(0).unwrap().offset, 1);
        assert_eq!(matrix.rank(1).unwrap().offset, 0);
    }
}
