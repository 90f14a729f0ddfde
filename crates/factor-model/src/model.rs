//! Alternating-least-squares latent factor model.
//!
//! Fits two dense factor matrices P (users x k) and Q (items x k) so
//! that P * Q^T approximates the observed cells of a partially
//! observed rating matrix. Each sweep alternately re-solves every
//! user row against the current item factors and every item column
//! against the just-updated user factors; both half-sweeps are
//! closed-form ridge regressions over only the observed entries.
//!
//! ## Algorithm
//! For user row i with observed item set O and ratings r:
//!
//! ```text
//! P_i = argmin_x || Q_O x - r ||^2 + lambda * |O| * ||x||^2
//! ```
//!
//! solved from the k x k system `(Q_O^T Q_O + lambda*|O|*I) x = Q_O^T r`
//! via SVD least squares, which yields the minimum-norm solution and
//! stays stable when the Gram matrix is rank deficient. Item columns
//! are updated symmetrically with their own regularizer mu.
//!
//! Rows and columns with zero observed ratings keep their random
//! N(0, 1) initialization and are never solved for. There is no early
//! stopping; the model always runs the configured sweep count.

use crate::error::{ModelError, Result};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

/// Singular values below this threshold are treated as zero by the
/// least-squares solver.
const SVD_EPS: f64 = 1e-12;

const USER_FACTORS_SUFFIX: &str = "__user_factors.bin";
const ITEM_FACTORS_SUFFIX: &str = "__item_factors.bin";

/// ALS latent factor model with per-side L2 regularization.
#[derive(Debug, Clone)]
pub struct LatentFactorModel {
    hidden_dim: usize,
    /// Regularization strength for user factors
    lambda: f64,
    /// Regularization strength for item factors
    mu: f64,
    max_iter: usize,
    seed: Option<u64>,

    p: Option<DMatrix<f64>>,
    q: Option<DMatrix<f64>>,
    sweep_mse: Vec<f64>,
}

impl LatentFactorModel {
    /// Create an unfitted model.
    ///
    /// # Arguments
    /// * `hidden_dim` - latent dimensionality k
    /// * `lambda` - L2 strength for user factors
    /// * `mu` - L2 strength for item factors
    /// * `max_iter` - fixed number of ALS sweeps
    pub fn new(hidden_dim: usize, lambda: f64, mu: f64, max_iter: usize) -> Self {
        Self {
            hidden_dim,
            lambda,
            mu,
            max_iter,
            seed: None,
            p: None,
            q: None,
            sweep_mse: Vec::new(),
        }
    }

    /// Seed the factor initialization for reproducible fits.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Observed-cell mean squared error recorded after each sweep of
    /// the last `fit` call.
    pub fn sweep_mse(&self) -> &[f64] {
        &self.sweep_mse
    }

    /// Fit P and Q against a dense matrix whose unobserved cells are
    /// `f64::NAN`.
    pub fn fit(&mut self, x: &DMatrix<f64>) -> Result<()> {
        let (n_users, n_items) = (x.nrows(), x.ncols());

        let mut rng: StdRng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut p =
            DMatrix::from_fn(n_users, self.hidden_dim, |_, _| rng.sample(StandardNormal));
        let mut q =
            DMatrix::from_fn(n_items, self.hidden_dim, |_, _| rng.sample(StandardNormal));

        // Observed column sets per row and row sets per column. Rows
        // and columns with no observations are skipped by every sweep
        // and keep their random initialization.
        let row_obs: Vec<Vec<usize>> = (0..n_users)
            .map(|i| (0..n_items).filter(|&j| !x[(i, j)].is_nan()).collect())
            .collect();
        let col_obs: Vec<Vec<usize>> = (0..n_items)
            .map(|j| (0..n_users).filter(|&i| !x[(i, j)].is_nan()).collect())
            .collect();

        let known_rows: Vec<usize> = (0..n_users).filter(|&i| !row_obs[i].is_empty()).collect();
        let known_cols: Vec<usize> = (0..n_items).filter(|&j| !col_obs[j].is_empty()).collect();

        info!(
            users = n_users,
            items = n_items,
            hidden_dim = self.hidden_dim,
            sweeps = self.max_iter,
            "starting ALS fit"
        );

        self.sweep_mse.clear();
        for sweep in 0..self.max_iter {
            // User half-sweep: each row solve only reads Q, so the
            // solves are independent and safe to run in parallel.
            let updates: Vec<(usize, DVector<f64>)> = known_rows
                .par_iter()
                .map(|&i| {
                    let obs = &row_obs[i];
                    let targets: Vec<f64> = obs.iter().map(|&j| x[(i, j)]).collect();
                    solve_regularized(&q, obs, &targets, self.lambda).map(|v| (i, v))
                })
                .collect::<Result<_>>()?;
            for (i, v) in updates {
                p.row_mut(i).copy_from(&v.transpose());
            }

            // Item half-sweep against the fully updated P.
            let updates: Vec<(usize, DVector<f64>)> = known_cols
                .par_iter()
                .map(|&j| {
                    let obs = &col_obs[j];
                    let targets: Vec<f64> = obs.iter().map(|&i| x[(i, j)]).collect();
                    solve_regularized(&p, obs, &targets, self.mu).map(|v| (j, v))
                })
                .collect::<Result<_>>()?;
            for (j, v) in updates {
                q.row_mut(j).copy_from(&v.transpose());
            }

            let mse = observed_mse(x, &p, &q);
            debug!(sweep, mse, "completed ALS sweep");
            self.sweep_mse.push(mse);
        }

        self.p = Some(p);
        self.q = Some(q);
        Ok(())
    }

    /// Predicted rating for a (user row, item column) pair.
    pub fn predict(&self, user_row: usize, item_col: usize) -> Result<f64> {
        let p = self.user_factors()?;
        let q = self.item_factors()?;
        if user_row >= p.nrows() {
            return Err(ModelError::IndexOutOfRange {
                axis: "user",
                index: user_row,
                len: p.nrows(),
            });
        }
        if item_col >= q.nrows() {
            return Err(ModelError::IndexOutOfRange {
                axis: "item",
                index: item_col,
                len: q.nrows(),
            });
        }
        Ok(p.row(user_row).dot(&q.row(item_col)))
    }

    /// The fitted user factor matrix P (users x k).
    pub fn user_factors(&self) -> Result<&DMatrix<f64>> {
        self.p.as_ref().ok_or(ModelError::Unfitted)
    }

    /// The fitted item factor matrix Q (items x k).
    pub fn item_factors(&self) -> Result<&DMatrix<f64>> {
        self.q.as_ref().ok_or(ModelError::Unfitted)
    }

    /// Persist both factor matrices as opaque binary blobs under a
    /// path prefix. No index metadata is embedded; the caller owns
    /// pairing the blobs with the right id mappings.
    pub fn save(&self, path_prefix: &Path) -> Result<()> {
        let p = self.user_factors()?;
        let q = self.item_factors()?;

        let file = File::create(factor_path(path_prefix, USER_FACTORS_SUFFIX))?;
        bincode::serialize_into(BufWriter::new(file), p)?;
        let file = File::create(factor_path(path_prefix, ITEM_FACTORS_SUFFIX))?;
        bincode::serialize_into(BufWriter::new(file), q)?;

        info!(prefix = %path_prefix.display(), "saved factor matrices");
        Ok(())
    }

    /// Restore both factor matrices from a path prefix written by
    /// [`save`](Self::save). Shapes are taken from the blobs as-is.
    pub fn load(&mut self, path_prefix: &Path) -> Result<()> {
        let file = File::open(factor_path(path_prefix, USER_FACTORS_SUFFIX))?;
        let p: DMatrix<f64> = bincode::deserialize_from(BufReader::new(file))?;
        let file = File::open(factor_path(path_prefix, ITEM_FACTORS_SUFFIX))?;
        let q: DMatrix<f64> = bincode::deserialize_from(BufReader::new(file))?;

        info!(
            users = p.nrows(),
            items = q.nrows(),
            prefix = %path_prefix.display(),
            "loaded factor matrices"
        );
        self.p = Some(p);
        self.q = Some(q);
        Ok(())
    }
}

fn factor_path(prefix: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = prefix.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    prefix.with_file_name(name)
}

/// Solve `(F_obs^T F_obs + reg * n_obs * I) x = F_obs^T r` for one
/// row/column, where `F_obs` are the fixed-side factor rows of the
/// observed entries.
fn solve_regularized(
    fixed: &DMatrix<f64>,
    observed: &[usize],
    targets: &[f64],
    reg: f64,
) -> Result<DVector<f64>> {
    let k = fixed.ncols();
    let n_obs = observed.len();

    let mut f_obs = DMatrix::zeros(n_obs, k);
    for (row, &idx) in observed.iter().enumerate() {
        f_obs.row_mut(row).copy_from(&fixed.row(idx));
    }
    let r = DVector::from_column_slice(targets);

    let mut gram = f_obs.transpose() * &f_obs;
    let ridge = reg * n_obs as f64;
    for d in 0..k {
        gram[(d, d)] += ridge;
    }
    let rhs = f_obs.transpose() * r;

    // Minimum-norm least-squares solution, stable under rank
    // deficiency. Never a direct inverse.
    let svd = gram.svd(true, true);
    svd.solve(&rhs, SVD_EPS)
        .map(|x| DVector::from_column_slice(x.as_slice()))
        .map_err(|e| ModelError::Solve(e.to_string()))
}

/// Mean squared error over the observed cells only.
fn observed_mse(x: &DMatrix<f64>, p: &DMatrix<f64>, q: &DMatrix<f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in 0..x.nrows() {
        for j in 0..x.ncols() {
            let value = x[(i, j)];
            if value.is_nan() {
                continue;
            }
            let predicted = p.row(i).dot(&q.row(j));
            sum += (value - predicted).powi(2);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4 x 3 matrix with one fully unobserved row and a couple of
    /// missing cells elsewhere.
    fn create_test_ratings() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            4,
            3,
            &[
                8.0,
                7.0,
                f64::NAN,
                6.0,
                f64::NAN,
                5.0,
                9.0,
                8.0,
                7.0,
                f64::NAN,
                f64::NAN,
                f64::NAN,
            ],
        )
    }

    #[test]
    fn test_predict_before_fit_is_unfitted() {
        let model = LatentFactorModel::new(4, 1.0, 1.0, 5);
        assert!(matches!(model.predict(0, 0), Err(ModelError::Unfitted)));
        assert!(matches!(model.user_factors(), Err(ModelError::Unfitted)));
        assert!(matches!(model.item_factors(), Err(ModelError::Unfitted)));
    }

    #[test]
    fn test_fit_shapes_and_predict() {
        let x = create_test_ratings();
        let mut model = LatentFactorModel::new(2, 0.1, 0.1, 10).with_seed(42);
        model.fit(&x).unwrap();

        assert_eq!(model.user_factors().unwrap().shape(), (4, 2));
        assert_eq!(model.item_factors().unwrap().shape(), (3, 2));
        assert!(model.predict(0, 2).unwrap().is_finite());
        assert!(matches!(
            model.predict(4, 0),
            Err(ModelError::IndexOutOfRange { axis: "user", .. })
        ));
    }

    #[test]
    fn test_sweep_mse_is_monotone_non_increasing() {
        let x = DMatrix::from_row_slice(
            3,
            3,
            &[8.0, 7.0, 6.0, 6.0, 5.0, 7.0, 9.0, 8.0, 7.0],
        );
        let mut model = LatentFactorModel::new(2, 0.05, 0.05, 25).with_seed(7);
        model.fit(&x).unwrap();

        let history = model.sweep_mse();
        assert_eq!(history.len(), 25);
        for window in history.windows(2) {
            assert!(
                window[1] <= window[0] + 1e-9,
                "MSE increased: {} -> {}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn test_fit_is_deterministic_with_seed() {
        let x = create_test_ratings();
        let mut a = LatentFactorModel::new(3, 1.0, 1.0, 5).with_seed(99);
        let mut b = LatentFactorModel::new(3, 1.0, 1.0, 5).with_seed(99);
        a.fit(&x).unwrap();
        b.fit(&x).unwrap();

        assert_eq!(a.user_factors().unwrap(), b.user_factors().unwrap());
        assert_eq!(a.item_factors().unwrap(), b.item_factors().unwrap());
    }

    #[test]
    fn test_unobserved_row_keeps_random_initialization() {
        let x = create_test_ratings();

        // Zero sweeps leaves every factor at its initialization; the
        // fully unobserved row 3 must match it after real sweeps too.
        let mut init_only = LatentFactorModel::new(2, 1.0, 1.0, 0).with_seed(11);
        init_only.fit(&x).unwrap();
        let mut fitted = LatentFactorModel::new(2, 1.0, 1.0, 8).with_seed(11);
        fitted.fit(&x).unwrap();

        let init_row = init_only.user_factors().unwrap().row(3).clone_owned();
        let fitted_row = fitted.user_factors().unwrap().row(3).clone_owned();
        assert_eq!(init_row, fitted_row);

        // Observed rows did move
        assert_ne!(
            init_only.user_factors().unwrap().row(0).clone_owned(),
            fitted.user_factors().unwrap().row(0).clone_owned()
        );
    }

    #[test]
    fn test_save_load_round_trip_is_bit_identical() {
        let x = create_test_ratings();
        let mut model = LatentFactorModel::new(2, 0.5, 0.5, 5).with_seed(3);
        model.fit(&x).unwrap();

        let dir = std::env::temp_dir().join(format!("factor-model-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let prefix = dir.join("cf");
        model.save(&prefix).unwrap();

        let mut restored = LatentFactorModel::new(2, 0.5, 0.5, 5);
        restored.load(&prefix).unwrap();

        assert_eq!(model.user_factors().unwrap(), restored.user_factors().unwrap());
        assert_eq!(model.item_factors().unwrap(), restored.item_factors().unwrap());
        assert_eq!(
            model.predict(0, 1).unwrap(),
            restored.predict(0, 1).unwrap()
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_blob_is_io_error() {
        let mut model = LatentFactorModel::new(2, 1.0, 1.0, 1);
        let result = model.load(Path::new("/nonexistent/prefix/cf"));
        assert!(matches!(result, Err(ModelError::IoError(_))));
    }
}
