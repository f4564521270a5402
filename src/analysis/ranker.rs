use itertools::Itertools;

use crate::domain::Candidate;

/// Best `k` candidates: ascending distance, ties broken by `(series_index, offset)`.
/// The order is total, so the selection is the same whatever order workers returned in.
pub fn rank_top_k(candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    candidates
        .into_iter()
        .k_smallest_by(k, Candidate::rank_cmp)
        .collect()
}
