use crate::error::SummaryError;
use crate::estimate::{central_and_spread, ci_bounds, Estimator, InvalidPolicy};
use crate::ess::{bulk_effective_sample_size, tail_effective_sample_size};
use crate::rhat::split_rank_normalized_rhat;
use crate::Chains;
use ndarray::{Array3, Axis};
use rayon::prelude::*;

/// One summary row per parameter: point estimate, uncertainty interval,
/// and convergence diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSummary {
    /// Parameter name (or rewritten display name once grouped).
    pub name: String,
    pub estimate: f64,
    pub est_error: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Rank-normalized folded split Rhat; 1 for valid parameters whose
    /// diagnostic is undefined (e.g. constants), NaN for invalid ones.
    pub rhat: f64,
    /// Bulk ESS, rounded to a whole draw count.
    pub ess_bulk: f64,
    /// Tail ESS, rounded to a whole draw count.
    pub ess_tail: f64,
    /// Whether every draw of this parameter was finite.
    pub valid: bool,
}

impl ParameterSummary {
    /// The fixed-width numeric tuple backing a report row.
    pub fn as_row(&self) -> [f64; 7] {
        [
            self.estimate,
            self.est_error,
            self.ci_lower,
            self.ci_upper,
            self.rhat,
            self.ess_bulk,
            self.ess_tail,
        ]
    }
}

fn param_chains(draws: &Array3<f64>, param: usize) -> Chains {
    draws
        .index_axis(Axis(2), param)
        .axis_iter(Axis(1))
        .map(|chain| chain.to_vec())
        .collect()
}

fn summarize_one(
    name: &str,
    chains: &Chains,
    prob: f64,
    diagnostics: bool,
) -> Result<ParameterSummary, SummaryError> {
    let flat: Vec<f64> = chains.iter().flat_map(|c| c.iter().copied()).collect();
    let valid = flat.iter().all(|v| v.is_finite());
    let total_draws = flat.len() as f64;

    let (estimate, est_error) =
        central_and_spread(&flat, Estimator::MeanSd, InvalidPolicy::Propagate);
    let (ci_lower, ci_upper) = ci_bounds(&flat, prob, InvalidPolicy::Propagate)?;

    let (mut rhat, mut ess_bulk, mut ess_tail) = (f64::NAN, f64::NAN, f64::NAN);
    if diagnostics {
        rhat = split_rank_normalized_rhat(chains).unwrap_or(f64::NAN);
        ess_bulk = bulk_effective_sample_size(chains).unwrap_or(f64::NAN);
        ess_tail = tail_effective_sample_size(chains).unwrap_or(f64::NAN);

        // Undefined diagnostics are substituted only for parameters whose
        // draws are all finite; invalid parameters keep NaN so the problem
        // stays visible downstream.  A non-positive ESS is undefined too:
        // the columns must stay representable as non-negative integers.
        if valid {
            if !rhat.is_finite() {
                rhat = 1.0;
            }
            if !ess_bulk.is_finite() || ess_bulk <= 0.0 {
                ess_bulk = total_draws;
            }
            if !ess_tail.is_finite() || ess_tail <= 0.0 {
                ess_tail = total_draws;
            }
        }
        ess_bulk = ess_bulk.round();
        ess_tail = ess_tail.round();
    }

    Ok(ParameterSummary {
        name: name.to_string(),
        estimate,
        est_error,
        ci_lower,
        ci_upper,
        rhat,
        ess_bulk,
        ess_tail,
        valid,
    })
}

/// Summarizes every parameter of a 3-D sample array (iteration x chain x
/// parameter), producing one row per name in input order.
///
/// `prob` is the two-sided coverage probability of the reported interval.
/// With `diagnostics` disabled (optimization-based fits) the three
/// diagnostic columns stay NaN and no fallback is applied.
///
/// Parameters are reduced independently and in parallel.
pub fn summarize_parameters(
    draws: &Array3<f64>,
    names: &[String],
    prob: f64,
    diagnostics: bool,
) -> Result<Vec<ParameterSummary>, SummaryError> {
    if !(0.0..=1.0).contains(&prob) {
        return Err(SummaryError::InvalidProbability { prob });
    }
    if draws.shape()[0] == 0 || draws.shape()[1] == 0 || names.is_empty() {
        return Err(SummaryError::EmptyInput);
    }
    if names.len() != draws.shape()[2] {
        return Err(SummaryError::ShapeMismatch {
            names: names.len(),
            params: draws.shape()[2],
        });
    }

    names
        .par_iter()
        .enumerate()
        .map(|(p, name)| summarize_one(name, &param_chains(draws, p), prob, diagnostics))
        .collect()
}
