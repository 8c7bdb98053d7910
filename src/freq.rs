use crate::error::SummaryError;
use ndarray::{Array2, Axis};
use rayon::prelude::*;

/// Relative frequencies of discrete levels, one row per column of the
/// input draw matrix (one column = one observation's predictive
/// distribution).
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    /// The ordered level set the frequencies refer to.
    pub levels: Vec<f64>,
    /// Shape (columns, levels); each row sums to 1 when the column had at
    /// least one usable draw.
    pub probs: Array2<f64>,
    /// Number of non-finite draws excluded from the denominators.
    pub dropped: usize,
}

/// Tabulates the relative frequency of each discrete level per column of a
/// (draws x columns) matrix, for ordinal/categorical posterior predictions.
///
/// When `levels` is `None` the level set defaults to the sorted unique
/// finite values observed anywhere in the matrix.  Non-finite entries are
/// excluded from the denominator and reported through `dropped` and a
/// `log::warn!`, never silently accepted.  Columns are tabulated
/// independently and in parallel.
pub fn frequency_table(
    draws: &Array2<f64>,
    levels: Option<&[f64]>,
) -> Result<FrequencyTable, SummaryError> {
    if draws.shape().iter().any(|&d| d == 0) {
        return Err(SummaryError::EmptyInput);
    }

    let levels: Vec<f64> = match levels {
        Some(explicit) => explicit.to_vec(),
        None => {
            let mut observed: Vec<f64> = draws.iter().copied().filter(|v| v.is_finite()).collect();
            observed.sort_by(f64::total_cmp);
            observed.dedup();
            observed
        }
    };

    let columns: Vec<Vec<f64>> = draws.axis_iter(Axis(1)).map(|c| c.to_vec()).collect();
    let per_column: Vec<(Vec<f64>, usize)> = columns
        .par_iter()
        .map(|column| {
            let mut counts = vec![0usize; levels.len()];
            let mut kept = 0usize;
            let mut dropped = 0usize;
            for &value in column.iter() {
                if !value.is_finite() {
                    dropped += 1;
                    continue;
                }
                if let Some(k) = levels.iter().position(|&l| l == value) {
                    counts[k] += 1;
                    kept += 1;
                }
            }
            let row = if kept > 0 {
                counts.iter().map(|&c| c as f64 / kept as f64).collect()
            } else {
                vec![0.0; levels.len()]
            };
            (row, dropped)
        })
        .collect();

    let dropped: usize = per_column.iter().map(|(_, d)| d).sum();
    if dropped > 0 {
        log::warn!(
            "excluded {} non-finite draws from frequency table denominators",
            dropped
        );
    }

    let n_cols = per_column.len();
    let mut probs = Array2::zeros((n_cols, levels.len()));
    for (c, (row, _)) in per_column.into_iter().enumerate() {
        for (k, p) in row.into_iter().enumerate() {
            probs[[c, k]] = p;
        }
    }

    Ok(FrequencyTable {
        levels,
        probs,
        dropped,
    })
}
