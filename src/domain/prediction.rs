use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::utils::maths_utils::get_min_max;

/// A matched historical segment rescaled into the query's frame.
/// `values[window_len - 1]` equals the query's last value; everything after it is
/// what actually happened next in that historical instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPath {
    pub series_index: usize,
    pub series_name: String,
    pub offset: usize,
    pub distance: f64,
    pub values: Vec<f64>,
}

impl PredictionPath {
    /// Last predicted value (end of the horizon).
    pub fn final_value(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}

/// Summary of where the matched paths ended up, relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalMoveStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Rank-ordered prediction paths, all of length `window_len + horizon`.
/// Row `i` of every path sits at time offset `i - window_len`:
/// negative offsets are history, `0..horizon` is the predicted future.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    pub window_len: usize,
    pub horizon: usize,
    pub paths: Vec<PredictionPath>,
}

impl ResultMatrix {
    pub fn empty(window_len: usize, horizon: usize) -> Self {
        Self {
            window_len,
            horizon,
            paths: Vec::new(),
        }
    }

    #[inline]
    pub fn path_len(&self) -> usize {
        self.window_len + self.horizon
    }

    /// Number of ranked paths (columns).
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Append a path. Refuses paths of the wrong length so the matrix stays rectangular.
    pub fn push(&mut self, path: PredictionPath) -> Result<(), PredictionPath> {
        if path.values.len() != self.path_len() {
            return Err(path);
        }
        self.paths.push(path);
        Ok(())
    }

    pub fn rank(&self, rank: usize) -> Option<&PredictionPath> {
        self.paths.get(rank)
    }

    pub fn time_offsets(&self) -> Vec<isize> {
        (0..self.path_len())
            .map(|i| i as isize - self.window_len as isize)
            .collect()
    }

    /// One row of the matrix: the value of every ranked path at step `row`.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.paths.iter().map(|p| p.values[row]).collect()
    }

    /// Consensus path: the per-step average across all ranked paths.
    pub fn mean_path(&self) -> Option<Vec<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(
            (0..self.path_len())
                .map(|row| self.row(row).mean())
                .collect(),
        )
    }

    /// Per-step (min, max) envelope across all ranked paths.
    pub fn band(&self) -> Option<Vec<(f64, f64)>> {
        if self.is_empty() {
            return None;
        }
        Some(
            (0..self.path_len())
                .map(|row| get_min_max(&self.row(row)))
                .collect(),
        )
    }

    pub fn final_move_stats(&self) -> Option<FinalMoveStats> {
        if self.is_empty() {
            return None;
        }
        let finals: Vec<f64> = self.paths.iter().map(PredictionPath::final_value).collect();
        let std_dev = if finals.len() > 1 {
            finals.iter().std_dev()
        } else {
            0.0
        };
        let (min, max) = get_min_max(&finals);

        Some(FinalMoveStats {
            mean: finals.iter().mean(),
            median: Data::new(finals.clone()).median(),
            std_dev,
            min,
            max,
        })
    }

    /// Wide CSV: one row per time offset, one column per rank.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);

        let mut header = vec!["time_offset".to_string()];
        header.extend((0..self.len()).map(|rank| format!("rank_{rank}")));
        writer.write_record(&header)?;

        for (row, offset) in self.time_offsets().into_iter().enumerate() {
            let mut record = vec![offset.to_string()];
            record.extend(self.row(row).iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush().context("Failed to flush result CSV")?;
        Ok(())
    }
}
