//! GP posterior predictive distribution of a single test point given one training window.

use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::parameters::Hyperparameters;

use linfa::Float;
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Posterior predictive distribution at one test point
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct PredictionResult<F: Float> {
    /// Posterior mean (d_out)
    pub(crate) mean: Array1<F>,
    /// Posterior covariance (d_out x d_out)
    pub(crate) covariance: Array2<F>,
}

impl<F: Float> PredictionResult<F> {
    /// Posterior mean vector
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Posterior covariance matrix
    pub fn covariance(&self) -> &Array2<F> {
        &self.covariance
    }

    /// Standard deviation per output dimension, covariance diagonal
    /// is clipped at zero before the square root
    pub fn std_dev(&self) -> Array1<F> {
        self.covariance.diag().mapv(|v| v.max(F::zero()).sqrt())
    }
}

/// Computes the GP posterior at `xtest` (1 x d) given training inputs `xtrain` (m x d),
/// training targets `ytrain` (m x d_out), kernel hyperparameters and `jitter`.
///
/// The regularized kernel matrix `K + sigma_y² I` is factorized once and the factor
/// is used for both mean and variance. Targets share the kernel, so the covariance is
/// `variance · I` with one scalar posterior variance.
pub fn windowed_posterior<F: Float, K: Kernel<F>>(
    kernel: &K,
    xtrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ytrain: &ArrayBase<impl Data<Elem = F>, Ix2>,
    xtest: &ArrayBase<impl Data<Elem = F>, Ix2>,
    hyperparameters: &Hyperparameters<F>,
    jitter: F,
) -> Result<PredictionResult<F>> {
    let m = xtrain.nrows();
    if m == 0 {
        return Err(GpError::InvalidValueError(
            "Training window is empty".to_string(),
        ));
    }
    if ytrain.nrows() != m {
        return Err(GpError::InvalidValueError(format!(
            "Training inputs and targets row counts differ ({} vs {})",
            m,
            ytrain.nrows()
        )));
    }
    if xtest.nrows() != 1 || xtest.ncols() != xtrain.ncols() {
        return Err(GpError::InvalidValueError(format!(
            "Test point should be a 1 x {} matrix, got {:?}",
            xtrain.ncols(),
            xtest.dim()
        )));
    }

    let mut k = kernel.value(xtrain, xtrain, hyperparameters);
    let noise = hyperparameters.noise_variance();
    k.diag_mut().mapv_inplace(|v| v + noise);
    if k.iter().any(|v| !v.is_finite()) {
        return Err(GpError::InvalidValueError(
            "Kernel matrix contains non finite values".to_string(),
        ));
    }
    let k_s = kernel.value(xtrain, xtest, hyperparameters);
    let k_ss = kernel.value(xtest, xtest, hyperparameters)[[0, 0]] + jitter;

    let chol = k.cholesky()?;
    // alpha = K^-1 Y
    let rho = chol.solve_triangular(ytrain, UPLO::Lower)?;
    let alpha = chol.t().solve_triangular(&rho, UPLO::Upper)?;
    let mean = k_s.t().dot(&alpha).row(0).to_owned();

    let v = chol.solve_triangular(&k_s, UPLO::Lower)?;
    let variance = k_ss - v.column(0).dot(&v.column(0));
    let covariance = Array2::eye(ytrain.ncols()) * variance;

    Ok(PredictionResult { mean, covariance })
}
