//! Sliding-window pass: one GP per window of M past rows predicts the next row.

use crate::errors::{GpError, Result};
use crate::kernels::{Kernel, SquaredExponentialLinearKernel};
use crate::parameters::{Hyperparameters, WindowedGpParams, WindowedGpValidParams};
use crate::posterior::{windowed_posterior, PredictionResult};

use linfa::Float;
use log::{debug, warn};
use ndarray::{s, Array2, ArrayBase, ArrayView2, Axis, Data, Ix2};
use std::fmt;

/// Reason why a window index produced no prediction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A training row of the window holds non finite values
    NonFiniteTrainingRow,
    /// Test point features are absent or hold non finite values
    MissingTestPoint,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::NonFiniteTrainingRow => write!(f, "non finite training row"),
            SkipReason::MissingTestPoint => write!(f, "missing test point"),
        }
    }
}

/// Outcome of the evaluation of one window
#[derive(Clone, Debug, PartialEq)]
pub enum WindowOutcome<F: Float> {
    /// Posterior at the test point
    Predicted(PredictionResult<F>),
    /// Index skipped for the given reason
    Skipped(SkipReason),
}

/// Result of a sliding-window pass over a dataset
#[derive(Clone, Debug)]
pub struct SlidingPrediction<F: Float> {
    /// Posterior means (n_predicted, n_targets)
    pub(crate) predictions: Array2<F>,
    /// Posterior standard deviations (n_predicted, n_targets)
    pub(crate) std_devs: Array2<F>,
    /// Dataset row index of each prediction row
    pub(crate) indices: Vec<usize>,
    /// Skipped row indices
    pub(crate) skipped: Vec<(usize, SkipReason)>,
}

impl<F: Float> SlidingPrediction<F> {
    /// Posterior means, one row per predicted index
    pub fn predictions(&self) -> &Array2<F> {
        &self.predictions
    }

    /// Posterior standard deviations, one row per predicted index
    pub fn std_devs(&self) -> &Array2<F> {
        &self.std_devs
    }

    /// Dataset row indices of predictions
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Skipped row indices with their reason
    pub fn skipped(&self) -> &[(usize, SkipReason)] {
        &self.skipped
    }

    /// Consumes the result into `(predictions, std_devs)`
    pub fn into_arrays(self) -> (Array2<F>, Array2<F>) {
        (self.predictions, self.std_devs)
    }
}

/// Sliding-window GP regression.
///
/// A dataset is a (N, d_in + d_out) matrix in time order whose trailing `n_targets`
/// columns are targets. For each row index `i` in `M..N` a GP is conditioned on rows
/// `[i-M, i)` and predicts the targets of row `i` from its features.
/// Each window is solved from scratch.
///
/// # Example
///
/// ```no_run
/// use wingp_gp::{Hyperparameters, SlidingWindowGp};
/// use ndarray::{Array, Axis, concatenate};
///
/// let t = Array::linspace(0., 99., 100).insert_axis(Axis(1));
/// let y = t.mapv(|v: f64| (v / 5.).sin());
/// let data = concatenate![Axis(1), t, y];
///
/// let gp = SlidingWindowGp::params(10)
///     .hyperparameters(Hyperparameters::new(1.0, 1.0, 0.1))
///     .build()
///     .expect("valid parameters");
/// let res = gp.predict(&data).expect("sliding-window predictions");
/// assert_eq!(res.predictions().nrows(), 90);
/// ```
#[derive(Clone, Debug)]
pub struct SlidingWindowGp<F: Float, K: Kernel<F> = SquaredExponentialLinearKernel> {
    params: WindowedGpValidParams<F, K>,
}

impl<F: Float> SlidingWindowGp<F, SquaredExponentialLinearKernel> {
    /// Sliding-window GP parameters constructor using the default kernel
    pub fn params(window_size: usize) -> WindowedGpParams<F, SquaredExponentialLinearKernel> {
        WindowedGpParams::new(window_size)
    }
}

impl<F: Float, K: Kernel<F>> SlidingWindowGp<F, K> {
    /// Constructor from validated parameters
    pub fn new(params: WindowedGpValidParams<F, K>) -> Self {
        SlidingWindowGp { params }
    }

    /// Validated parameters
    pub fn parameters(&self) -> &WindowedGpValidParams<F, K> {
        &self.params
    }

    /// Kernel hyperparameters
    pub fn hyperparameters(&self) -> &Hyperparameters<F> {
        self.params.hyperparameters()
    }

    /// Number of feature columns of a dataset given its column count
    fn n_features(&self, ncols: usize) -> Result<usize> {
        let n_targets = self.params.n_targets();
        if ncols <= n_targets {
            return Err(GpError::InvalidConfigError(format!(
                "Dataset should have at least one feature column besides {} target column(s), got {} column(s)",
                n_targets, ncols
            )));
        }
        Ok(ncols - n_targets)
    }

    /// Evaluate the window predicting row `index` of `data`.
    ///
    /// The window is made of the `M` rows preceding `index`, which must be at least `M`.
    /// A window holding a non finite value is skipped.
    /// A factorization failure is fatal and reports `index`.
    pub fn predict_at(
        &self,
        data: &ArrayBase<impl Data<Elem = F>, Ix2>,
        index: usize,
    ) -> Result<WindowOutcome<F>> {
        let nf = self.n_features(data.ncols())?;
        let window_size = self.params.window_size();
        if index < window_size {
            return Err(GpError::InvalidConfigError(format!(
                "Row {} has fewer than {} preceding rows to form a window",
                index, window_size
            )));
        }
        if index >= data.nrows() {
            return Ok(WindowOutcome::Skipped(SkipReason::MissingTestPoint));
        }
        let xtest = data.slice(s![index..index + 1, ..nf]);
        if xtest.iter().any(|v| !v.is_finite()) {
            return Ok(WindowOutcome::Skipped(SkipReason::MissingTestPoint));
        }

        let window = data.slice(s![index - window_size..index, ..]);
        if window.iter().any(|v| !v.is_finite()) {
            return Ok(WindowOutcome::Skipped(SkipReason::NonFiniteTrainingRow));
        }
        let (xtrain, ytrain) = window.split_at(Axis(1), nf);

        windowed_posterior(
            &self.params.kernel,
            &xtrain,
            &ytrain,
            &xtest,
            &self.params.hyperparameters,
            self.params.jitter,
        )
        .map(WindowOutcome::Predicted)
        .map_err(|err| match err {
            GpError::LinalgError(source) => GpError::WindowFactorizationError { index, source },
            err => err,
        })
    }

    /// Run the sliding-window pass over `data` and collect posterior means and
    /// standard deviations of every predicted row index in `M..N`.
    ///
    /// Fails with [`GpError::NoPredictionError`] when no index is predicted,
    /// in particular when the window size is not smaller than the dataset length.
    pub fn predict(&self, data: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<SlidingPrediction<F>> {
        let nf = self.n_features(data.ncols())?;
        let n_targets = data.ncols() - nf;
        let window_size = self.params.window_size();
        let n = data.nrows();
        if window_size >= n {
            return Err(GpError::NoPredictionError(format!(
                "window size {} is not smaller than dataset length {}",
                window_size, n
            )));
        }

        let mut predictions = Array2::zeros((n - window_size, n_targets));
        let mut std_devs = Array2::zeros((n - window_size, n_targets));
        let mut indices = Vec::with_capacity(n - window_size);
        let mut skipped = vec![];
        for index in window_size..n {
            match self.predict_at(data, index)? {
                WindowOutcome::Predicted(res) => {
                    let row = indices.len();
                    predictions.row_mut(row).assign(res.mean());
                    std_devs.row_mut(row).assign(&res.std_dev());
                    indices.push(index);
                }
                WindowOutcome::Skipped(reason) => {
                    warn!("Window predicting row {} skipped: {}", index, reason);
                    skipped.push((index, reason));
                }
            }
        }

        if indices.is_empty() {
            return Err(GpError::NoPredictionError(format!(
                "all {} windows skipped",
                skipped.len()
            )));
        }
        let n_pred = indices.len();
        debug!(
            "Sliding-window pass: {} predictions, {} skipped, hyperparameters {}",
            n_pred,
            skipped.len(),
            self.params.hyperparameters
        );
        Ok(SlidingPrediction {
            predictions: predictions.slice_move(s![..n_pred, ..]),
            std_devs: std_devs.slice_move(s![..n_pred, ..]),
            indices,
            skipped,
        })
    }

    /// Target columns of `data` matching the rows of a sliding-window result
    pub fn targets_of(
        &self,
        data: &ArrayBase<impl Data<Elem = F>, Ix2>,
        prediction: &SlidingPrediction<F>,
    ) -> Result<Array2<F>> {
        let nf = self.n_features(data.ncols())?;
        let targets: ArrayView2<F> = data.slice(s![.., nf..]);
        Ok(targets.select(Axis(0), prediction.indices()))
    }
}
