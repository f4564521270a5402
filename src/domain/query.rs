use serde::{Deserialize, Serialize};

use crate::config::SEARCH;
use crate::error::QueryError;

/// The shape we are searching for: a short price window normalized so it ends at 1.0.
/// Built once per search and shared read-only with every worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryWindow {
    values: Vec<f64>,
}

impl QueryWindow {
    /// Divide raw closing prices by their last value so the window ends at exactly 1.0.
    pub fn from_raw_closes(closes: &[f64]) -> Result<Self, QueryError> {
        check_values(closes)?;

        let last = closes[closes.len() - 1];
        if last == 0.0 {
            return Err(QueryError::ZeroLast(last));
        }
        // Divide rather than multiply by the reciprocal so the last value is exactly 1.0
        let values = closes.iter().map(|&c| c / last).collect();

        Ok(Self { values })
    }

    /// Accept a window that the caller already normalized.
    pub fn from_normalized(values: Vec<f64>) -> Result<Self, QueryError> {
        check_values(&values)?;

        let last = values[values.len() - 1];
        if (last - 1.0).abs() > SEARCH.anchor_tolerance {
            return Err(QueryError::NotNormalized(last));
        }

        Ok(Self { values })
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Never true for a constructed window; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The anchor every prediction path is rescaled to.
    #[inline]
    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Horizon the acquisition layer used by default: 20% of the query length, at least 1.
    pub fn default_horizon(&self) -> usize {
        (self.len() / SEARCH.horizon_divisor).max(1)
    }
}

fn check_values(values: &[f64]) -> Result<(), QueryError> {
    if values.is_empty() {
        return Err(QueryError::Empty);
    }
    if values.len() < SEARCH.min_window_len {
        return Err(QueryError::TooShort {
            len: values.len(),
            min: SEARCH.min_window_len,
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(QueryError::NonFinite { index });
    }
    Ok(())
}
