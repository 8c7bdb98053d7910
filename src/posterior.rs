use crate::error::SummaryError;
use crate::estimate::{central_and_spread, quantile, Estimator, InvalidPolicy};
use ndarray::{Array3, ArrayD, Axis};

/// Output of [`posterior_summary`]: a labeled numeric array with one row per
/// parameter and columns `Estimate, Est.Error, Q<p>...`; a rank-3 input
/// keeps its extra dimension as a third output axis.
#[derive(Debug, Clone)]
pub struct PosteriorSummary {
    pub columns: Vec<String>,
    pub values: ArrayD<f64>,
}

fn quantile_label(p: f64) -> String {
    format!("Q{}", p * 100.0)
}

/// Reduces a 2-D (draws x parameters) or 3-D (draws x parameters x extra,
/// e.g. predicted observations) sample array along the draw axis, using
/// `(median, mad)` when `robust` and `(mean, sd)` otherwise, plus the
/// requested quantiles.
///
/// Unlike the MCMC-specific reducer this is chain-agnostic and computes no
/// convergence diagnostics.
pub fn posterior_summary(
    draws: &ArrayD<f64>,
    probs: &[f64],
    robust: bool,
) -> Result<PosteriorSummary, SummaryError> {
    for &p in probs {
        if !(0.0..=1.0).contains(&p) {
            return Err(SummaryError::InvalidProbability { prob: p });
        }
    }
    let rank = draws.ndim();
    if rank != 2 && rank != 3 {
        return Err(SummaryError::InvalidRank { rank });
    }
    if draws.shape().iter().any(|&d| d == 0) {
        return Err(SummaryError::EmptyInput);
    }

    let estimator = Estimator::from_robust(robust);
    let mut columns = vec!["Estimate".to_string(), "Est.Error".to_string()];
    columns.extend(probs.iter().map(|&p| quantile_label(p)));

    // Treat rank 2 as rank 3 with a single trailing slice, reduce, then
    // collapse the axis again on the way out.
    let cube = draws
        .to_owned()
        .into_shape((
            draws.shape()[0],
            draws.shape()[1],
            if rank == 3 { draws.shape()[2] } else { 1 },
        ))
        .expect("shape is consistent with ndim");

    let n_params = cube.shape()[1];
    let n_extra = cube.shape()[2];
    let mut values = Array3::<f64>::zeros((n_params, columns.len(), n_extra));
    for param in 0..n_params {
        for extra in 0..n_extra {
            let sample: Vec<f64> = cube
                .index_axis(Axis(1), param)
                .index_axis(Axis(1), extra)
                .to_vec();
            let (center, spread) = central_and_spread(&sample, estimator, InvalidPolicy::Propagate);
            values[[param, 0, extra]] = center;
            values[[param, 1, extra]] = spread;
            for (k, &p) in probs.iter().enumerate() {
                values[[param, 2 + k, extra]] = quantile(&sample, p, InvalidPolicy::Propagate)?;
            }
        }
    }

    let values = if rank == 2 {
        values
            .into_shape(vec![n_params, columns.len()])
            .expect("trailing singleton axis collapses")
    } else {
        values.into_dyn()
    };

    Ok(PosteriorSummary { columns, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_rank2_mean_and_median_agree_on_symmetric_data() {
        // Single column of draws, non-robust estimators: Estimate is the
        // arithmetic mean and Q50 the sample median.
        let draws: Vec<f64> = (1..=101).map(|i| i as f64).collect();
        let arr = Array2::from_shape_vec((101, 1), draws).unwrap().into_dyn();
        let s = posterior_summary(&arr, &[0.5], false).unwrap();
        assert_eq!(s.columns, vec!["Estimate", "Est.Error", "Q50"]);
        assert_abs_diff_eq!(s.values[[0, 0]], 51.0, epsilon = 1e-10);
        assert_abs_diff_eq!(s.values[[0, 2]], 51.0, epsilon = 1e-10);
    }

    #[test]
    fn test_robust_uses_median_and_mad()  {
        // An outlier moves the mean but not the median.
        let mut draws: Vec<f64> = vec![1.0; 99];
        draws.push(1000.0);
        let arr = Array2::from_shape_vec((100, 1), draws).unwrap().into_dyn();
        let s = posterior_summary(&arr, &[], true).unwrap();
        assert_abs_diff_eq!(s.values[[0, 0]], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(s.values[[0, 1]], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rank3_preserves_extra_axis() {
        let arr = Array3::from_shape_fn((50, 2, 3), |(d, p, e)| {
            d as f64 + 100.0 * p as f64 + 1000.0 * e as f64
        })
        .into_dyn();
        let s = posterior_summary(&arr, &[0.025, 0.975], false).unwrap();
        assert_eq!(s.values.shape(), &[2, 4, 3]);
        // Mean over draws 0..50 is 24.5, offset by the param/extra encoding.
        assert_abs_diff_eq!(s.values[[1, 0, 2]], 24.5 + 100.0 + 2000.0, epsilon = 1e-9);
        assert_eq!(s.columns, vec!["Estimate", "Est.Error", "Q2.5", "Q97.5"]);
    }

    #[test]
    fn test_quantile_labels() {
        assert_eq!(quantile_label(0.025), "Q2.5");
        assert_eq!(quantile_label(0.5), "Q50");
        assert_eq!(quantile_label(0.975), "Q97.5");
    }

    #[test]
    fn test_empty_input_rejected() {
        let arr = Array2::<f64>::zeros((0, 3)).into_dyn();
        assert!(matches!(
            posterior_summary(&arr, &[0.5], false),
            Err(SummaryError::EmptyInput)
        ));
    }

    #[test]
    fn test_invalid_rank_rejected() {
        let arr = ndarray::Array1::<f64>::zeros(10).into_dyn();
        assert!(matches!(
            posterior_summary(&arr, &[0.5], false),
            Err(SummaryError::InvalidRank { rank: 1 })
        ));
        let arr4 = ndarray::Array4::<f64>::zeros((2, 2, 2, 2)).into_dyn();
        assert!(matches!(
            posterior_summary(&arr4, &[0.5], false),
            Err(SummaryError::InvalidRank { rank: 4 })
        ));
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let arr = Array2::<f64>::ones((10, 1)).into_dyn();
        assert!(matches!(
            posterior_summary(&arr, &[0.5, 1.5], false),
            Err(SummaryError::InvalidProbability { .. })
        ));
    }
}
