//! # Board Data Crate
//!
//! Domain types and rating-matrix utilities for the expert ranking
//! engine.
//!
//! ## Main Components
//!
//! - **types**: the forum corpus (games, forums, threads, posts) and
//!   the user rating store
//! - **matrix**: dense rating matrix with NaN missing-value markers
//!   and bijective id <-> index mappings
//! - **mask**: train/test masking of observed cells
//! - **snapshot**: JSON snapshot loading/saving for the collected
//!   corpus
//! - **error**: error types for data handling
//!
//! ## Example Usage
//!
//! ```ignore
//! use board_data::{snapshot, RatingMatrix};
//! use std::path::Path;
//!
//! let ratings = snapshot::load_ratings(Path::new("snapshot"))?;
//! let matrix = RatingMatrix::from_store(&ratings)?;
//!
//! let (rows, cols) = matrix.shape();
//! println!("{} raters x {} games", rows, cols);
//! ```

// Public modules
pub mod error;
pub mod mask;
pub mod matrix;
pub mod snapshot;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataError, Result};
pub use matrix::{EntityIndex, RatingMatrix};
pub use types::{Forum, Game, GameId, Post, RatingStore, Thread, ThreadId, UserId};
