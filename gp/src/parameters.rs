use crate::errors::{GpError, Result};
use crate::kernels::{Kernel, SquaredExponentialLinearKernel};
use crate::sliding::SlidingWindowGp;
use linfa::{Float, ParamGuard};

use ndarray::{arr1, Array1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default jitter added to the test-test covariance
pub const DEFAULT_JITTER: f64 = 1e-8;
/// Default number of trailing target columns
pub const DEFAULT_N_TARGETS: usize = 1;

/// Kernel hyperparameters `(length_scale, sigma_f, sigma_y)` where
/// `sigma_y` is the observation noise standard deviation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct Hyperparameters<F: Float> {
    length_scale: F,
    sigma_f: F,
    sigma_y: F,
}

impl<F: Float> Default for Hyperparameters<F> {
    fn default() -> Self {
        Self::from_f64(Self::DEFAULT_INIT)
    }
}

impl<F: Float> Hyperparameters<F> {
    /// Number of hyperparameters
    pub const SIZE: usize = 3;
    /// Initial guess used when calibrating `(length_scale, sigma_f, sigma_y)`
    pub const DEFAULT_INIT: [f64; 3] = [1.0, 1.0, 0.1];
    /// Lower bound applied to every hyperparameter during calibration
    pub const LOWER_BOUND: f64 = 1e-5;

    /// Constructor
    pub fn new(length_scale: F, sigma_f: F, sigma_y: F) -> Self {
        Hyperparameters {
            length_scale,
            sigma_f,
            sigma_y,
        }
    }

    fn from_f64(values: [f64; 3]) -> Self {
        Self::new(F::cast(values[0]), F::cast(values[1]), F::cast(values[2]))
    }

    /// Build hyperparameters from a `[length_scale, sigma_f, sigma_y]` slice
    pub fn from_slice(values: &[F]) -> Result<Self> {
        match values {
            [length_scale, sigma_f, sigma_y] => Ok(Self::new(*length_scale, *sigma_f, *sigma_y)),
            _ => Err(GpError::InvalidValueError(format!(
                "Expected {} hyperparameters (length_scale, sigma_f, sigma_y), got {}",
                Self::SIZE,
                values.len()
            ))),
        }
    }

    /// Length scale of the squared exponential term
    pub fn length_scale(&self) -> F {
        self.length_scale
    }

    /// Output scale of the squared exponential term
    pub fn sigma_f(&self) -> F {
        self.sigma_f
    }

    /// Observation noise standard deviation
    pub fn sigma_y(&self) -> F {
        self.sigma_y
    }

    /// Noise variance `sigma_y²` added to the training covariance diagonal
    pub fn noise_variance(&self) -> F {
        self.sigma_y * self.sigma_y
    }

    /// Hyperparameters as `[length_scale, sigma_f, sigma_y]`
    pub fn to_array(&self) -> Array1<F> {
        arr1(&[self.length_scale, self.sigma_f, self.sigma_y])
    }

    /// Whether all values are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        [self.length_scale, self.sigma_f, self.sigma_y]
            .iter()
            .all(|v| v.is_finite() && *v > F::zero())
    }
}

impl<F: Float> fmt::Display for Hyperparameters<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "(length_scale={}, sigma_f={}, sigma_y={})",
            self.length_scale, self.sigma_f, self.sigma_y
        )
    }
}

/// A set of validated windowed GP parameters.
///
/// This is an immutable configuration value: changing hyperparameters
/// gives a new value (see [`WindowedGpValidParams::with_hyperparameters`]).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "F: Serialize, K: Serialize",
        deserialize = "F: Deserialize<'de>, K: Deserialize<'de>"
    ))
)]
pub struct WindowedGpValidParams<F: Float, K: Kernel<F>> {
    /// Number of past observations used as GP training set
    pub(crate) window_size: usize,
    /// Number of trailing target columns in dataset matrices
    pub(crate) n_targets: usize,
    /// Kernel hyperparameters
    pub(crate) hyperparameters: Hyperparameters<F>,
    /// Jitter added to the test-test covariance
    pub(crate) jitter: F,
    /// Covariance kernel
    pub(crate) kernel: K,
}

impl<F: Float, K: Kernel<F>> Default for WindowedGpValidParams<F, K> {
    fn default() -> WindowedGpValidParams<F, K> {
        WindowedGpValidParams {
            window_size: 1,
            n_targets: DEFAULT_N_TARGETS,
            hyperparameters: Hyperparameters::default(),
            jitter: F::cast(DEFAULT_JITTER),
            kernel: K::default(),
        }
    }
}

impl<F: Float, K: Kernel<F>> WindowedGpValidParams<F, K> {
    /// Get window size
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Get number of target columns
    pub fn n_targets(&self) -> usize {
        self.n_targets
    }

    /// Get kernel hyperparameters
    pub fn hyperparameters(&self) -> &Hyperparameters<F> {
        &self.hyperparameters
    }

    /// Get jitter
    pub fn jitter(&self) -> F {
        self.jitter
    }

    /// Get covariance kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Returns the same configuration with other hyperparameters
    pub fn with_hyperparameters(&self, hyperparameters: Hyperparameters<F>) -> Result<Self> {
        WindowedGpParams::new_from_valid(self)
            .hyperparameters(hyperparameters)
            .check()
    }
}

#[derive(Clone, Debug)]
/// The set of parameters that can be specified for the execution of
/// the [sliding-window GP algorithm](SlidingWindowGp).
pub struct WindowedGpParams<F: Float, K: Kernel<F>>(WindowedGpValidParams<F, K>);

impl<F: Float> WindowedGpParams<F, SquaredExponentialLinearKernel> {
    /// A constructor for windowed GP parameters given the window size
    /// using the squared exponential plus linear kernel.
    pub fn new(window_size: usize) -> Self {
        Self::new_with_kernel(window_size, SquaredExponentialLinearKernel::default())
    }
}

impl<F: Float, K: Kernel<F>> WindowedGpParams<F, K> {
    /// A constructor for windowed GP parameters given window size and kernel
    pub fn new_with_kernel(window_size: usize, kernel: K) -> Self {
        Self(WindowedGpValidParams {
            window_size,
            kernel,
            ..Default::default()
        })
    }

    /// A constructor for windowed GP parameters from validated parameters
    pub fn new_from_valid(params: &WindowedGpValidParams<F, K>) -> Self {
        Self(params.clone())
    }

    /// Set the window size.
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.0.window_size = window_size;
        self
    }

    /// Set the number of trailing target columns.
    pub fn n_targets(mut self, n_targets: usize) -> Self {
        self.0.n_targets = n_targets;
        self
    }

    /// Set kernel hyperparameters.
    pub fn hyperparameters(mut self, hyperparameters: Hyperparameters<F>) -> Self {
        self.0.hyperparameters = hyperparameters;
        self
    }

    /// Set jitter.
    ///
    /// Jitter is added to the test-test covariance diagonal
    pub fn jitter(mut self, jitter: F) -> Self {
        self.0.jitter = jitter;
        self
    }

    /// Set covariance kernel.
    pub fn kernel(mut self, kernel: K) -> Self {
        self.0.kernel = kernel;
        self
    }

    /// Check parameters and build the sliding-window GP
    pub fn build(self) -> Result<SlidingWindowGp<F, K>> {
        Ok(SlidingWindowGp::new(self.check()?))
    }
}

impl<F: Float, K: Kernel<F>> From<WindowedGpValidParams<F, K>> for WindowedGpParams<F, K> {
    fn from(valid: WindowedGpValidParams<F, K>) -> Self {
        WindowedGpParams(valid)
    }
}

impl<F: Float, K: Kernel<F>> ParamGuard for WindowedGpParams<F, K> {
    type Checked = WindowedGpValidParams<F, K>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.window_size == 0 {
            return Err(GpError::InvalidConfigError(
                "`window_size` should be at least 1".to_string(),
            ));
        }
        if self.0.n_targets == 0 {
            return Err(GpError::InvalidConfigError(
                "`n_targets` should be at least 1".to_string(),
            ));
        }
        if !self.0.hyperparameters.is_valid() {
            return Err(GpError::InvalidValueError(format!(
                "Hyperparameters should be finite and strictly positive, got {}",
                self.0.hyperparameters
            )));
        }
        if !self.0.jitter.is_finite() || self.0.jitter < F::zero() {
            return Err(GpError::InvalidValueError(format!(
                "`jitter` should be finite and non negative, got {}",
                self.0.jitter
            )));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
