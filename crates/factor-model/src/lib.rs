//! # Factor Model Crate
//!
//! Alternating-least-squares latent factor model for the partially
//! observed rating matrix.
//!
//! The model is deliberately ignorant of external identifiers: it
//! consumes a dense `DMatrix<f64>` with `f64::NAN` missing-value
//! markers and exposes factors by row/column position. Pairing rows
//! with usernames is the caller's job via `board_data::EntityIndex`,
//! and the persisted blobs embed no index metadata either.

pub mod error;
pub mod model;

// Re-export commonly used types
pub use error::{ModelError, Result};
pub use model::LatentFactorModel;
