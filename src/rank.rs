use crate::utils::flatten;
use crate::Chains;
use statrs::distribution::{ContinuousCDF, Normal};

/// Rank-normalizes draws pooled across chains: each value is replaced by the
/// standard-normal quantile of its fractional average rank, using the Blom
/// offset `(r - 3/8) / (S + 1/4)` from Vehtari et al. 2021.  Ties receive
/// their average rank so constant stretches stay constant.
pub fn rank_normalize(chains: &Chains) -> Chains {
    let total: usize = chains.iter().map(|c| c.len()).sum();
    if total == 0 {
        return chains.clone();
    }
    let normal = Normal::new(0.0, 1.0).expect("Normal(0,1) should be valid");

    let mut out: Chains = chains.iter().map(|c| vec![0.0; c.len()]).collect();

    // Flatten draws with back-references into (chain, position).
    let mut flat: Vec<(f64, usize, usize)> = Vec::with_capacity(total);
    for (ci, chain) in chains.iter().enumerate() {
        for (ti, &x) in chain.iter().enumerate() {
            flat.push((x, ci, ti));
        }
    }
    // Total order: NaNs sort past the finite values instead of breaking
    // the comparator contract.
    flat.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = flat.len() as f64;
    let mut i = 0usize;
    while i < flat.len() {
        let mut j = i + 1;
        while j < flat.len() && flat[j].0 == flat[i].0 {
            j += 1;
        }

        // Average of the 1-based ranks covered by this tie run.
        let rank = 0.5 * ((i as f64 + 1.0) + j as f64);
        let p = ((rank - 0.375) / (n + 0.25)).clamp(1e-12, 1.0 - 1e-12);
        let z = normal.inverse_cdf(p);

        for k in i..j {
            let (_x, ci, ti) = flat[k];
            out[ci][ti] = z;
        }
        i = j;
    }

    out
}

/// Folds draws around the pooled median, `|x - median|`.  Rank-normalizing
/// the folded draws makes the diagnostics sensitive to scale (tail)
/// differences that mean-focused statistics miss.
pub fn fold_at_median(chains: &Chains) -> Chains {
    let mut pooled = flatten(chains);
    pooled.sort_by(f64::total_cmp);
    let med = if pooled.is_empty() {
        f64::NAN
    } else {
        let mid = pooled.len() / 2;
        if pooled.len() % 2 == 0 {
            0.5 * (pooled[mid - 1] + pooled[mid])
        } else {
            pooled[mid]
        }
    };
    chains
        .iter()
        .map(|c| c.iter().map(|&x| (x - med).abs()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_normalize_is_monotone_and_centered() {
        let chains = vec![vec![10.0, 30.0], vec![20.0, 40.0]];
        let z = rank_normalize(&chains);
        // Order preserved: 10 < 20 < 30 < 40.
        assert!(z[0][0] < z[1][0]);
        assert!(z[1][0] < z[0][1]);
        assert!(z[0][1] < z[1][1]);
        // Symmetric ranks give a mean of zero.
        let sum: f64 = z.iter().flat_map(|c| c.iter()).sum();
        assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rank_normalize_ties_share_z() {
        let chains = vec![vec![1.0, 2.0, 2.0, 3.0]];
        let z = rank_normalize(&chains);
        assert_abs_diff_eq!(z[0][1], z[0][2], epsilon = 1e-12);
        assert!(z[0][0] < z[0][1]);
        assert!(z[0][2] < z[0][3]);
    }

    #[test]
    fn test_rank_normalize_constant_stays_constant() {
        let chains = vec![vec![5.0; 4], vec![5.0; 4]];
        let z = rank_normalize(&chains);
        for chain in &z {
            for &v in chain {
                assert_abs_diff_eq!(v, z[0][0], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_rank_normalize_tolerates_non_finite() {
        // NaNs sort past the finite draws and take the highest ranks; the
        // finite draws keep their relative order.
        let chains = vec![vec![1.0, f64::NAN, 3.0], vec![2.0, 4.0, f64::NAN]];
        let z = rank_normalize(&chains);
        assert!(z[0][0] < z[1][0]);
        assert!(z[1][0] < z[0][2]);
        assert!(z[0][2] < z[1][1]);
    }

    #[test]
    fn test_fold_at_median() {
        let chains = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        // Pooled median is 2.5.
        let folded = fold_at_median(&chains);
        assert_eq!(folded[0], vec![1.5, 0.5]);
        assert_eq!(folded[1], vec![0.5, 1.5]);
    }

    #[test]
    fn test_fold_odd_count() {
        let chains = vec![vec![1.0, 2.0, 9.0]];
        let folded = fold_at_median(&chains);
        assert_eq!(folded[0], vec![1.0, 0.0, 7.0]);
    }
}
