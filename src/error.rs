//! Error types for the analysis pipeline.

use thiserror::Error;

/// Errors raised by the windowing, normalization and estimation stages.
///
/// Every variant is recoverable: the caller corrects the offending input
/// (boundaries, window, fit value) and re-runs the stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid window: {reason}")]
    InvalidWindow { reason: String },

    #[error("Degenerate {series} series: {reason}")]
    DegenerateSeries { series: &'static str, reason: String },

    #[error("{parameter} not estimated: {reason}")]
    EstimationUnavailable {
        parameter: &'static str,
        reason: String,
    },
}

/// Result alias for analysis stages.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
