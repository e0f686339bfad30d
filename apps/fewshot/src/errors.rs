use thiserror::Error;

use crate::evaluation::metrics::MetricError;
use crate::fewshot::sampler::SamplingError;

/// Application-level error type.
/// Wraps the errors of the pure preparation, scoring and report stages.
/// Corpus loading and client construction surface their own errors to `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),

    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Report I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
