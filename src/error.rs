use thiserror::Error;

/// Errors returned by the public summary, classification, and tabulation APIs.
///
/// Degenerate samples (constant or non-finite draws) are deliberately *not*
/// part of this taxonomy: they are detected per parameter and handled through
/// the diagnostic fallback policy instead of failing the whole request.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("coverage probability must lie in [0, 1]; got {prob}")]
    InvalidProbability { prob: f64 },
    #[error("input contains no samples")]
    EmptyInput,
    #[error("expected an array of rank 2 or 3; got rank {rank}")]
    InvalidRank { rank: usize },
    #[error("expected one name per parameter slice; got {names} names for {params} parameters")]
    ShapeMismatch { names: usize, params: usize },
    #[error("parameter `{name}` matches no known naming convention and is not excluded")]
    ClassificationGap { name: String },
    #[error("parameter `{name}` appears more than once in the input")]
    DuplicateParameter { name: String },
}
