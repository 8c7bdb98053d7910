//! A Rust library computing posterior summaries and convergence diagnostics
//! for named parameters drawn from a multi-chain MCMC sampler: per-parameter
//! point estimates and uncertainty intervals, rank-normalized split Rhat and
//! bulk/tail effective sample size (Vehtari et al. 2021), semantic grouping
//! of parameters by naming convention, a generic 2-D/3-D posterior reducer,
//! and discrete frequency tables for ordinal predictions.
//!
//! This crate is sampler agnostic: it consumes an in-memory sample array
//! (iteration x chain x parameter) and a parameter-name list from any MCMC
//! backend and produces structured numeric summaries for reporting.
#[macro_use]
extern crate approx;

/// Parameter classification by naming convention
pub mod classify;
/// Error taxonomy of the public API
pub mod error;
/// Effective Sample Size (ESS), bulk and tail variants
pub mod ess;
/// Location, scale, and quantile estimators
pub mod estimate;
/// Discrete frequency tables
pub mod freq;
/// Generic 2-D/3-D posterior summary
pub mod posterior;
/// Rank normalization and folding
pub mod rank;
/// Report assembly
pub mod report;
/// Potential scale reduction (Rhat), basic and rank-normalized
pub mod rhat;
/// Per-parameter summary reduction
pub mod summary;
/// Convenience utilities like chain splitting and certain helper functions
/// intended mostly for internal use (e.g. summary statistics and validity
/// checks shared by the diagnostics)
pub mod utils;

/// One chain of draws for a single parameter
pub type Chain = Vec<f64>;
/// A set of chains for the same parameter
pub type Chains = Vec<Chain>;

pub use classify::{classify, Classified, ClassifierConfig, GroupPartition, ParamKind, Partition};
pub use error::SummaryError;
pub use ess::{
    bulk_effective_sample_size, compute_effective_sample_size, compute_estimated_mcse,
    compute_split_effective_sample_size, tail_effective_sample_size,
};
pub use estimate::{central_and_spread, ci_bounds, quantile, Estimator, InvalidPolicy};
pub use freq::{frequency_table, FrequencyTable};
pub use posterior::{posterior_summary, PosteriorSummary};
pub use report::{
    assemble_report, Algorithm, DataInfo, GroupSummary, GroupingFactor, SamplerInfo,
    SummaryReport, RHAT_WARN_THRESHOLD,
};
pub use rhat::{
    potential_scale_reduction_factor, split_potential_scale_reduction_factor,
    split_rank_normalized_rhat,
};
pub use summary::{summarize_parameters, ParameterSummary};
