//! Error types for the board-data crate.

use thiserror::Error;

/// Errors that can occur while loading snapshots or building matrices
#[derive(Error, Debug)]
pub enum DataError {
    /// I/O error occurred while reading a snapshot file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Snapshot file could not be deserialized
    #[error("Malformed snapshot {file}: {source}")]
    SnapshotFormat {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// The rating store contained no observed ratings at all
    #[error("Rating store is empty, cannot build a rating matrix")]
    EmptyRatings,

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Test fraction must lie strictly inside (0, 1)
    #[error("Test fraction {0} is outside (0, 1)")]
    InvalidTestFraction(f64),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataError>;
