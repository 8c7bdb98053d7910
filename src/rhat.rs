use crate::rank::{fold_at_median, rank_normalize};
use crate::utils::{check_diagnosable, mean, sample_variance, split_chains};
use crate::{Chain, Chains};
use anyhow::{Error, Result};

/// Computes the potential scale reduction (Rhat) for the specified
/// parameter across all kept samples.  Chains are trimmed from the
/// back to match the length of the shortest chain.
///
/// See more details in Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction).
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_potential_scale_reduction.hpp]()
pub fn potential_scale_reduction_factor(chains: &Chains) -> Result<f64, Error> {
    let m = chains.len();
    let n = chains.iter().map(|c| c.len()).min().unwrap();
    let mut chain_mean: Chain = Vec::new();
    let mut chain_var: Chain = Vec::new();

    for chain in chains.iter().take(m) {
        chain_mean.push(mean(chain)?);
        chain_var.push(sample_variance(chain)?);
    }

    let n = n as f64;
    let var_between = n * sample_variance(&chain_mean)?;
    let var_within = mean(&chain_var)?;
    let result = ((var_between / var_within + n - 1.0) / n).sqrt();

    Ok(result)
}

/// Computes the split potential scale reduction (Rhat) for the
/// specified parameter across all kept samples.  When the number of
/// total draws N is odd, the (N+1)/2th draw is ignored.
///
/// Chains are trimmed from the back to match the
/// length of the shortest chain.
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_potential_scale_reduction.hpp]()
pub fn split_potential_scale_reduction_factor(chains: &Chains) -> Result<f64, Error> {
    let num_draws = chains.iter().map(|c| c.len()).min().unwrap();
    // trim chains to the length of the shortest chain
    let mut trimmed = Vec::new();
    for chain in chains.iter() {
        trimmed.push(chain[..num_draws].to_vec());
    }
    let split = split_chains(trimmed)?;
    potential_scale_reduction_factor(&split)
}

/// Computes the rank-normalized, folded split Rhat of Vehtari et al. 2021:
/// the maximum of the split Rhat of the rank-normalized draws (bulk
/// location convergence) and of the rank-normalized folded draws
/// (scale/tail convergence).
///
/// Errs when the draws contain non-finite values or are constant, in which
/// case Rhat is undefined and the caller chooses a fallback.
pub fn split_rank_normalized_rhat(chains: &Chains) -> Result<f64, Error> {
    check_diagnosable(chains)?;

    let num_draws = chains.iter().map(|c| c.len()).min().unwrap();
    let mut trimmed = Vec::new();
    for chain in chains.iter() {
        trimmed.push(chain[..num_draws].to_vec());
    }
    let split = split_chains(trimmed)?;

    let bulk = potential_scale_reduction_factor(&rank_normalize(&split))?;
    let tail = potential_scale_reduction_factor(&rank_normalize(&fold_at_median(&split)))?;

    Ok(bulk.max(tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn normal_chain(seed: u64, n: usize, loc: f64) -> Chain {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let normal = Normal::new(loc, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn test_basic_rhat_well_mixed() {
        let chains = vec![normal_chain(1, 500, 0.0), normal_chain(2, 500, 0.0)];
        let rhat = potential_scale_reduction_factor(&chains).unwrap();
        assert!(rhat < 1.05, "Rhat for well-mixed chains should be ~1: {}", rhat);
    }

    #[test]
    fn test_split_rhat_detects_trend() {
        // A strongly trending chain looks fine to the unsplit statistic but
        // the split halves disagree.
        let trending: Chain = (0..500).map(|i| i as f64 * 0.01).collect();
        let chains = vec![trending.clone(), trending];
        let rhat = split_potential_scale_reduction_factor(&chains).unwrap();
        assert!(rhat > 1.5, "split Rhat should flag a trend: {}", rhat);
    }

    #[test]
    fn test_rank_normalized_rhat_well_mixed() {
        let chains = vec![normal_chain(1, 500, 0.0), normal_chain(2, 500, 0.0)];
        let rhat = split_rank_normalized_rhat(&chains).unwrap();
        assert!(rhat < 1.05, "rank-normalized Rhat for IID chains should be ~1: {}", rhat);
        assert!(rhat >= 0.0);
    }

    #[test]
    fn test_rank_normalized_rhat_diverged_chains() {
        let chains = vec![normal_chain(1, 200, 0.0), normal_chain(2, 200, 10.0)];
        let rhat = split_rank_normalized_rhat(&chains).unwrap();
        assert!(rhat > 1.5, "Rhat for diverged chains should be >> 1: {}", rhat);
    }

    #[test]
    fn test_rank_normalized_rhat_catches_scale_mismatch() {
        // Same location, very different spread: the folded pass must flag it.
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        let narrow = Normal::new(0.0, 1.0).unwrap();
        let wide = Normal::new(0.0, 20.0).unwrap();
        let a: Chain = (0..400).map(|_| narrow.sample(&mut rng)).collect();
        let b: Chain = (0..400).map(|_| wide.sample(&mut rng)).collect();
        let rhat = split_rank_normalized_rhat(&vec![a, b]).unwrap();
        assert!(rhat > 1.1, "folded Rhat should flag scale mismatch: {}", rhat);
    }

    #[test]
    fn test_rank_normalized_rhat_undefined_cases() {
        // Constant draws: undefined, caller substitutes.
        assert!(split_rank_normalized_rhat(&vec![vec![2.5; 100], vec![2.5; 100]]).is_err());
        // Non-finite draws: undefined.
        assert!(split_rank_normalized_rhat(&vec![vec![1.0, f64::NAN, 2.0, 3.0]]).is_err());
    }
}
