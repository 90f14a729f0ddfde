//! Train/test masking of observed ratings.
//!
//! Holds out a fraction of the observed cells uniformly at random
//! without replacement. The two resulting matrices partition the
//! observed cells exactly: no cell is observed in both, and every
//! originally observed cell is observed in exactly one.

use crate::error::{DataError, Result};
use crate::matrix::RatingMatrix;
use rand::seq::SliceRandom;
use rand::Rng;

impl RatingMatrix {
    /// Split the observed cells into a train and a test matrix.
    ///
    /// `test_fraction` must lie strictly inside (0, 1). The held-out
    /// count is `floor(observed * test_fraction)`. Both returned
    /// matrices share this matrix's index mappings.
    pub fn train_test_split<R: Rng>(
        &self,
        test_fraction: f64,
        rng: &mut R,
    ) -> Result<(RatingMatrix, RatingMatrix)> {
        if !(0.0..=1.0).contains(&test_fraction) || test_fraction == 0.0 || test_fraction == 1.0 {
            return Err(DataError::InvalidTestFraction(test_fraction));
        }

        let values = self.values();
        let mut observed: Vec<(usize, usize)> = (0..values.nrows())
            .flat_map(|row| (0..values.ncols()).map(move |col| (row, col)))
            .filter(|&(row, col)| !values[(row, col)].is_nan())
            .collect();
        observed.shuffle(rng);

        let n_test = (observed.len() as f64 * test_fraction) as usize;

        let mut train = values.clone();
        let mut test = values.clone();
        for (i, &(row, col)) in observed.iter().enumerate() {
            if i < n_test {
                train[(row, col)] = f64::NAN;
            } else {
                test[(row, col)] = f64::NAN;
            }
        }

        Ok((
            RatingMatrix::from_parts(train, self.users().clone(), self.games().clone()),
            RatingMatrix::from_parts(test, self.users().clone(), self.games().clone()),
        ))
    }
}
