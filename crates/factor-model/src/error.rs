//! Error types for the factor-model crate.

use thiserror::Error;

/// Errors that can occur while fitting, querying or persisting the
/// latent factor model
#[derive(Error, Debug)]
pub enum ModelError {
    /// Factors were requested before `fit` or `load`
    #[error("Model has no factors yet, call fit or load first")]
    Unfitted,

    /// A row/column index fell outside the fitted factor matrices
    #[error("{axis} index {index} out of range for {len} fitted entities")]
    IndexOutOfRange {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    /// The regularized least-squares solve failed
    #[error("Least-squares solve failed: {0}")]
    Solve(String),

    /// I/O error while persisting or restoring factors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Factor blob could not be encoded or decoded
    #[error("Factor serialization error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ModelError>;
