use crate::error::SummaryError;
use average::Variance;

/// Scale factor making the MAD a consistent estimator of the standard
/// deviation under normality (1 / qnorm(0.75), as used by R's `mad`).
const MAD_SCALE: f64 = 1.4826;

/// How estimators treat non-finite sample values.
///
/// This is an explicit argument everywhere rather than a silent default:
/// dropping NaNs without being asked hides upstream sampler problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidPolicy {
    /// Keep non-finite values; estimates poison to NaN.
    Propagate,
    /// Drop non-finite values before estimation.
    Omit,
}

/// Closed set of location/scale estimator pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimator {
    /// Arithmetic mean and Bessel-corrected standard deviation.
    MeanSd,
    /// Median and scaled median absolute deviation.
    MedianMad,
}

impl Estimator {
    /// Select the estimator pair from a robustness flag.
    pub fn from_robust(robust: bool) -> Self {
        if robust {
            Estimator::MedianMad
        } else {
            Estimator::MeanSd
        }
    }
}

fn screened(x: &[f64], policy: InvalidPolicy) -> Vec<f64> {
    match policy {
        InvalidPolicy::Propagate => x.to_vec(),
        InvalidPolicy::Omit => x.iter().copied().filter(|v| v.is_finite()).collect(),
    }
}

/// Location and scale of a sample under the chosen estimator pair.
///
/// Returns `(NaN, NaN)` for an empty sample (or one emptied by `Omit`).
pub fn central_and_spread(x: &[f64], estimator: Estimator, policy: InvalidPolicy) -> (f64, f64) {
    let kept = screened(x, policy);
    if kept.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    match estimator {
        Estimator::MeanSd => {
            let acc: Variance = kept.iter().copied().collect();
            (acc.mean(), acc.sample_variance().sqrt())
        }
        Estimator::MedianMad => {
            let med = median_of(&kept);
            let deviations: Vec<f64> = kept.iter().map(|v| (v - med).abs()).collect();
            (med, MAD_SCALE * median_of(&deviations))
        }
    }
}

fn median_of(x: &[f64]) -> f64 {
    quantile_of_unsorted(x, 0.5)
}

fn quantile_of_unsorted(x: &[f64], p: f64) -> f64 {
    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, p)
}

/// Linearly interpolated sample quantile of pre-sorted data (R type 7).
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let last = sorted.len() - 1;
    let position = p.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        (1.0 - weight) * sorted[lower] + weight * sorted[upper]
    }
}

/// Sample quantile at probability `p` (R type 7 interpolation).
pub fn quantile(x: &[f64], p: f64, policy: InvalidPolicy) -> Result<f64, SummaryError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SummaryError::InvalidProbability { prob: p });
    }
    let kept = screened(x, policy);
    if kept.iter().any(|v| !v.is_finite()) {
        return Ok(f64::NAN);
    }
    Ok(quantile_of_unsorted(&kept, p))
}

/// Lower and upper bounds of the central interval holding probability
/// mass `prob`, i.e. the quantiles at `(1-prob)/2` and `1-(1-prob)/2`.
pub fn ci_bounds(x: &[f64], prob: f64, policy: InvalidPolicy) -> Result<(f64, f64), SummaryError> {
    if !(0.0..=1.0).contains(&prob) {
        return Err(SummaryError::InvalidProbability { prob });
    }
    let alpha = (1.0 - prob) / 2.0;
    Ok((quantile(x, alpha, policy)?, quantile(x, 1.0 - alpha, policy)?))
}
