//! Error types for the index engine.

use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised while computing a standardized index.
///
/// [`IndexError::InvalidParameter`] aborts the whole call. The other two
/// variants are raised per position and end up as absent values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Invalid parameter or malformed input series.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Too few observations for a three-parameter fit.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The distribution fit broke down numerically.
    #[error("fit did not converge: {0}")]
    FitNonConvergence(String),
}

impl IndexError {
    /// Whether the error only affects a single position of the series.
    pub fn is_local(&self) -> bool {
        !matches!(self, IndexError::InvalidParameter(_))
    }
}
