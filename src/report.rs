use crate::classify::{classify, Classified, ClassifierConfig};
use crate::error::SummaryError;
use crate::summary::{summarize_parameters, ParameterSummary};
use ndarray::Array3;

/// Rhat threshold above which the report carries a convergence advisory.
pub const RHAT_WARN_THRESHOLD: f64 = 1.05;

/// How the posterior draws were produced.  Convergence diagnostics are only
/// meaningful for chain-based sampling and are skipped otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sampling,
    Optimization,
}

/// A grouping factor known from the model structure.
#[derive(Debug, Clone)]
pub struct GroupingFactor {
    pub name: String,
    /// Number of observed levels of the factor.
    pub levels: usize,
}

/// Sampler metadata supplied by the model-fitting collaborator.
#[derive(Debug, Clone)]
pub struct SamplerInfo {
    pub algorithm: Algorithm,
    /// Human-readable sampler description, e.g. `sampling(NUTS)`.
    pub description: String,
    pub chains: usize,
    /// Iterations per chain, including warmup.
    pub iterations: usize,
    pub warmup: usize,
    pub thin: usize,
    pub divergent_transitions: usize,
}

/// Provenance of the modeled data.
#[derive(Debug, Clone)]
pub struct DataInfo {
    pub source: String,
    pub nobs: usize,
}

/// Group-level rows for one grouping factor.
#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub group: String,
    pub levels: usize,
    pub rows: Vec<ParameterSummary>,
}

/// The structured report handed to the printer: per-group summary tables
/// keyed by display name plus scalar metadata.
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub data: DataInfo,
    pub sampler: SamplerInfo,
    /// Coverage probability of the reported intervals.
    pub prob: f64,
    /// Post-warmup draws across all chains.
    pub total_draws: usize,
    pub population: Vec<ParameterSummary>,
    pub group_level: Vec<GroupSummary>,
    pub family: Vec<ParameterSummary>,
    pub residual_cor: Vec<ParameterSummary>,
    pub autocor: Vec<ParameterSummary>,
    pub smooth: Vec<ParameterSummary>,
    pub mono_simplex: Vec<ParameterSummary>,
    pub gp: Vec<ParameterSummary>,
    /// Advisory diagnostics; the summary always completes even when the
    /// underlying fit is statistically unreliable.
    pub warnings: Vec<String>,
}

fn relabeled(rows: &[ParameterSummary], entries: &[Classified]) -> Vec<ParameterSummary> {
    entries
        .iter()
        .map(|e| {
            let mut row = rows[e.index].clone();
            row.name = e.display.clone();
            row
        })
        .collect()
}

/// Assembles the full structured summary: classifies the parameter names,
/// reduces every parameter once, then slices the summary rows per semantic
/// group under their rewritten display names.
pub fn assemble_report(
    draws: &Array3<f64>,
    names: &[String],
    grouping_factors: &[GroupingFactor],
    sampler: SamplerInfo,
    data: DataInfo,
    prob: f64,
    config: &ClassifierConfig,
) -> Result<SummaryReport, SummaryError> {
    let group_labels: Vec<String> = grouping_factors.iter().map(|g| g.name.clone()).collect();
    let partition = classify(names, &group_labels, config)?;

    let diagnostics = sampler.algorithm == Algorithm::Sampling;
    // One reduction over the full parameter set; groups only slice it.
    let rows = summarize_parameters(draws, names, prob, diagnostics)?;
    let total_draws = draws.shape()[0] * draws.shape()[1];

    let group_level = partition
        .groups
        .iter()
        .zip(grouping_factors)
        .map(|(bucket, factor)| {
            let mut group_rows = relabeled(&rows, &bucket.sd);
            group_rows.extend(relabeled(&rows, &bucket.cor));
            group_rows.extend(relabeled(&rows, &bucket.df));
            GroupSummary {
                group: factor.name.clone(),
                levels: factor.levels,
                rows: group_rows,
            }
        })
        .collect();

    let mut report = SummaryReport {
        data,
        sampler,
        prob,
        total_draws,
        population: relabeled(&rows, &partition.population),
        group_level,
        family: relabeled(&rows, &partition.family),
        residual_cor: relabeled(&rows, &partition.residual_cor),
        autocor: relabeled(&rows, &partition.autocor),
        smooth: relabeled(&rows, &partition.smooth),
        mono_simplex: relabeled(&rows, &partition.mono_simplex),
        gp: relabeled(&rows, &partition.gp),
        warnings: Vec::new(),
    };

    if diagnostics {
        let kept: Vec<usize> = partition_indices(&partition);
        let high_rhat = kept
            .iter()
            .filter(|&&i| rows[i].rhat.is_finite() && rows[i].rhat > RHAT_WARN_THRESHOLD)
            .count();
        if high_rhat > 0 {
            let msg = format!(
                "{} parameter(s) have Rhat > {}; the chains have likely not mixed. \
                 Running more iterations may help.",
                high_rhat, RHAT_WARN_THRESHOLD
            );
            log::warn!("{}", msg);
            report.warnings.push(msg);
        }
        if report.sampler.divergent_transitions > 0 {
            let msg = format!(
                "there were {} divergent transition(s) after warmup; \
                 increasing adapt_delta above its default may help.",
                report.sampler.divergent_transitions
            );
            log::warn!("{}", msg);
            report.warnings.push(msg);
        }
    }

    Ok(report)
}

fn partition_indices(partition: &crate::classify::Partition) -> Vec<usize> {
    let mut indices = Vec::with_capacity(partition.classified_len());
    for bucket in [
        &partition.population,
        &partition.family,
        &partition.residual_cor,
        &partition.autocor,
        &partition.smooth,
        &partition.mono_simplex,
        &partition.gp,
    ] {
        indices.extend(bucket.iter().map(|e| e.index));
    }
    for group in &partition.groups {
        for bucket in [&group.sd, &group.cor, &group.df] {
            indices.extend(bucket.iter().map(|e| e.index));
        }
    }
    indices
}
