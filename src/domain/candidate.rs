use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One scored window inside the corpus.
/// Invariant: `offset + window_len + horizon <= len(series[series_index])`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub distance: f64,
    pub series_index: usize,
    pub offset: usize,
}

impl Candidate {
    pub fn new(distance: f64, series_index: usize, offset: usize) -> Self {
        Self {
            distance,
            series_index,
            offset,
        }
    }

    /// Ranking order: closest first, then lowest series index, then lowest offset.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.series_index.cmp(&other.series_index))
            .then(self.offset.cmp(&other.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_cmp_breaks_ties_by_position() {
        let a = Candidate::new(0.01, 2, 5);
        let b = Candidate::new(0.01, 2, 7);
        let c = Candidate::new(0.01, 1, 9);
        let d = Candidate::new(0.005, 9, 0);

        assert_eq!(a.rank_cmp(&b), Ordering::Less);
        assert_eq!(c.rank_cmp(&a), Ordering::Less);
        assert_eq!(d.rank_cmp(&c), Ordering::Less);
        assert_eq!(a.rank_cmp(&a), Ordering::Equal);
    }
}
