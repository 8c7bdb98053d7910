use crate::estimate::{quantile, InvalidPolicy};
use crate::rank::rank_normalize;
use crate::utils::{check_diagnosable, flatten, mean, sample_variance, split_chains};
use crate::{Chain, Chains};
use anyhow::{anyhow, Error, Result};
use arima::acf;

/// Computes the effective sample size (ESS) for the specified
/// parameter across all kept samples.  The value returned is the
/// minimum of ESS and the number_total_draws * log10(number_total_draws).
///
/// Chains are trimmed from the back to match the
/// length of the shortest chain.  Note that the effective sample size
/// can not be estimated with fewer than four draws.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation)
///
/// Based on reference implementation in Stan v2.4.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_effective_sample_size.hpp#L32-L138]()
///
///
/// # Arguments
/// * `chains` - Reference to a vector of chains, each of which is a vector of samples for
///              the same parameter
pub fn compute_effective_sample_size(chains: &Chains) -> Result<f64, Error> {
    let num_chains = chains.len();
    let num_draws = chains.iter().map(|c| c.len()).min().unwrap_or(0);

    if num_draws < 4 {
        return Err(anyhow!("Must have at least 4 samples to compute ESS"));
    }
    check_diagnosable(chains)?;

    let mut chain_acov: Chains = Vec::new();
    let mut chain_mean: Chain = Vec::new();
    let mut chain_var: Chain = Vec::new();
    for chain in chains.iter() {
        let acov = acf::acf(&chain, None, true).unwrap();
        chain_mean.push(mean(&chain)?);
        chain_var.push(acov[0] * num_draws as f64 / (num_draws as f64 - 1.0));
        chain_acov.push(acov);
    }

    let mean_var = mean(&chain_var)?;
    let mut var_plus = mean_var * (num_draws as f64 - 1.0) / num_draws as f64;
    if num_chains > 1 {
        var_plus += sample_variance(&chain_mean)?;
    }

    let mut rho_hat_s: Chain = vec![0.0; num_draws];
    let mut acov_s: Chain = vec![0.0; num_chains];
    for c in 0..num_chains {
        acov_s[c] = chain_acov[c][1]
    }
    let mut rho_hat_even = 1.0;
    rho_hat_s[0] = rho_hat_even;
    let mut rho_hat_odd = 1.0 - (mean_var - mean(&acov_s)?) / var_plus;
    rho_hat_s[1] = rho_hat_odd;

    // Convert raw autocovariance estimators into Geyer's initial
    // positive sequence. Loop only until num_draws - 4 to
    // leave the last pair of autocorrelations as a bias term that
    // reduces variance in the case of antithetical chains.
    let mut s = 1;
    while s < (num_draws - 4) && (rho_hat_even + rho_hat_odd) > 0.0 {
        for c in 0..num_chains {
            acov_s[c] = chain_acov[c][s + 1];
        }
        rho_hat_even = 1.0 - (mean_var - mean(&acov_s)?) / var_plus;
        for c in 0..num_chains {
            acov_s[c] = chain_acov[c][s + 2];
        }
        rho_hat_odd = 1.0 - (mean_var - mean(&acov_s)?) / var_plus;
        if (rho_hat_even + rho_hat_odd) >= 0.0 {
            rho_hat_s[s + 1] = rho_hat_even;
            rho_hat_s[s + 2] = rho_hat_odd;
        }
        s += 2;
    }

    let max_s = s;
    // this is used in the improved estimate, which reduces variance
    // in antithetic case -- see tau_hat below
    if rho_hat_even > 0.0 {
        rho_hat_s[max_s + 1] = rho_hat_even;
    }

    // Convert Geyer's initial positive sequence into an initial
    // monotone sequence
    let mut s = 1;
    while max_s >= 3 && s <= (max_s - 3) {
        if (rho_hat_s[s + 1] + rho_hat_s[s + 2]) > (rho_hat_s[s - 1] + rho_hat_s[s]) {
            rho_hat_s[s + 1] = (rho_hat_s[s - 1] + rho_hat_s[s]) / 2.0;
            rho_hat_s[s + 2] = rho_hat_s[s + 1];
        };
        s += 2;
    }

    let num_total_draws = num_chains as f64 * num_draws as f64;
    // Geyer's truncated estimator for the asymptotic variance
    // Improved estimate reduces variance in antithetic case
    let tau_hat: f64 =
        -1.0 + 2.0 * rho_hat_s.iter().take(max_s).sum::<f64>() + rho_hat_s[max_s + 1];
    // Antithetic draws can push tau_hat negative; floor it as Stan does so
    // ESS stays positive (and bounded by the log10 cap below).
    let tau_hat = tau_hat.max(1.0 / num_total_draws.log10());
    let option1: f64 = num_total_draws / tau_hat;
    let option2: f64 = num_total_draws * num_total_draws.log10();
    Ok(option1.min(option2))
}

fn trimmed_split(chains: &Chains) -> Result<Chains, Error> {
    let num_draws = chains.iter().map(|c| c.len()).min().unwrap_or(0);
    // trim chains to the length of the shortest chain
    let mut trimmed = Vec::new();
    for chain in chains.iter() {
        trimmed.push(chain[..num_draws].to_vec());
    }
    split_chains(trimmed)
}

/// Computes the split effective sample size (ESS) for the specified
/// parameter across all kept samples.  When the number of total draws N
/// is odd, the (N+1)/2th draw is ignored.
///
/// # Arguments
/// * `chains` - Reference to a vector of chains, each of which is a vector of samples for
///              the same parameter
pub fn compute_split_effective_sample_size(chains: &Chains) -> Result<f64, Error> {
    compute_effective_sample_size(&trimmed_split(chains)?)
}

/// Bulk effective sample size of Vehtari et al. 2021: the split-chain ESS
/// of the rank-normalized draws.  Measures sampling efficiency in the bulk
/// of the distribution, robust to heavy tails.
pub fn bulk_effective_sample_size(chains: &Chains) -> Result<f64, Error> {
    check_diagnosable(chains)?;
    compute_effective_sample_size(&rank_normalize(&trimmed_split(chains)?))
}

/// Tail effective sample size of Vehtari et al. 2021: the minimum of the
/// split-chain ESS of the rank-normalized 5% and 95% tail-indicator draws.
/// Measures how reliably extreme quantiles are estimated.
pub fn tail_effective_sample_size(chains: &Chains) -> Result<f64, Error> {
    check_diagnosable(chains)?;

    let pooled = flatten(chains);
    let q05 = quantile(&pooled, 0.05, InvalidPolicy::Propagate)?;
    let q95 = quantile(&pooled, 0.95, InvalidPolicy::Propagate)?;

    let indicator = |cut: f64, below: bool| -> Chains {
        chains
            .iter()
            .map(|c| {
                c.iter()
                    .map(|&x| {
                        let hit = if below { x <= cut } else { x >= cut };
                        if hit {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect()
    };

    let lower = bulk_effective_sample_size(&indicator(q05, true))?;
    let upper = bulk_effective_sample_size(&indicator(q95, false))?;
    Ok(lower.min(upper))
}

/// Computes the Monte Carlo Standard Error (MCSE) for the specified parameter
/// across all samples, which is the standard deviation of the samples over the
/// square root of effective sample size.
///
/// See the Stan reference manual section
/// ["Estimation of MCMC Standard Error"](https://mc-stan.org/docs/2_24/reference-manual/effective-sample-size-section.html#estimation-of-mcmc-standard-error)
///
///
/// # Arguments
/// * `chains` - Reference to a vector of chains, each of which is a vector of samples for
///              the same parameter
pub fn compute_estimated_mcse(chains: &Chains) -> Result<f64, Error> {
    let ess = compute_effective_sample_size(&chains)?;
    let var = sample_variance(&flatten(chains))?;
    Ok((var / ess).sqrt())
}
