//! Error types for the wine quality pipeline

use thiserror::Error;

/// Errors returned by pipeline construction and by per-request operations.
///
/// Construction failures (`DataUnavailable`, `InsufficientData`,
/// `DegenerateFeature`, `Config`) are fatal at startup. `InvalidInput` and
/// `NotFound` are reported back to the caller of `predict`/`lookup`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Dataset source unreadable or malformed
    #[error("dataset unavailable: {0}")]
    DataUnavailable(String),

    /// Not enough records to split or fit
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Feature has zero range in the training partition
    #[error("feature '{feature}' has zero range in the training partition (min = max = {value})")]
    DegenerateFeature { feature: String, value: f64 },

    /// Transform or predict called before fit
    #[error("{0} used before fit")]
    NotFitted(&'static str),

    /// Malformed inference request
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Lookup miss
    #[error("no wine found with id {0}")]
    NotFound(i64),

    /// Configuration file unreadable or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Model serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Whether the caller can recover from this error (per-request failures)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::NotFound(_))
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
