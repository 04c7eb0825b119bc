use crate::errors::{CalibError, Result};
use crate::objective::CalibrationObjective;
use crate::optimizers::{Algorithm, Minimizer, Optimizer, MAX_EVAL_DEFAULT};

use log::{info, warn};
use ndarray::{ArrayBase, Data, Ix2};
use serde::{Deserialize, Serialize};
use std::fmt;
use wingp_gp::kernels::{Kernel, SquaredExponentialLinearKernel};
use wingp_gp::{Hyperparameters, WindowedGpValidParams};

/// Calibration configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Starting point `[length_scale, sigma_f, sigma_y]`
    pub(crate) initial_guess: [f64; 3],
    /// Lower bound of every hyperparameter
    pub(crate) lower_bound: f64,
    /// Optional upper bound of every hyperparameter (unbounded when None)
    pub(crate) upper_bound: Option<f64>,
    /// Optimization algorithm
    pub(crate) algorithm: Algorithm,
    /// Maximum number of objective evaluations
    pub(crate) max_eval: usize,
    /// Relative tolerance on objective value
    pub(crate) ftol_rel: f64,
    /// Absolute tolerance on objective value
    pub(crate) ftol_abs: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            initial_guess: Hyperparameters::<f64>::DEFAULT_INIT,
            lower_bound: Hyperparameters::<f64>::LOWER_BOUND,
            upper_bound: None,
            algorithm: Algorithm::default(),
            max_eval: MAX_EVAL_DEFAULT,
            ftol_rel: 1e-6,
            ftol_abs: 0.,
        }
    }
}

impl CalibrationConfig {
    /// Sets the optimization starting point
    pub fn initial_guess(mut self, hyperparameters: Hyperparameters<f64>) -> Self {
        self.initial_guess = [
            hyperparameters.length_scale(),
            hyperparameters.sigma_f(),
            hyperparameters.sigma_y(),
        ];
        self
    }

    /// Sets the lower bound applied to each hyperparameter
    pub fn lower_bound(mut self, lower_bound: f64) -> Self {
        self.lower_bound = lower_bound;
        self
    }

    /// Sets an upper bound applied to each hyperparameter
    pub fn upper_bound(mut self, upper_bound: f64) -> Self {
        self.upper_bound = Some(upper_bound);
        self
    }

    /// Removes the upper bound
    pub fn unbounded(mut self) -> Self {
        self.upper_bound = None;
        self
    }

    /// Sets the optimization algorithm
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets max number of objective evaluations
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    /// Sets the relative tolerance on objective value
    pub fn ftol_rel(mut self, ftol_rel: f64) -> Self {
        self.ftol_rel = ftol_rel;
        self
    }

    /// Sets the absolute tolerance on objective value
    pub fn ftol_abs(mut self, ftol_abs: f64) -> Self {
        self.ftol_abs = ftol_abs;
        self
    }

    /// Box bounds of the three hyperparameters
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        let upper = self.upper_bound.unwrap_or(f64::INFINITY);
        vec![(self.lower_bound, upper); Hyperparameters::<f64>::SIZE]
    }

    fn check(&self) -> Result<()> {
        if !(self.lower_bound.is_finite() && self.lower_bound > 0.) {
            return Err(CalibError::InvalidConfigError(format!(
                "Lower bound should be finite and strictly positive, got {}",
                self.lower_bound
            )));
        }
        if let Some(upper) = self.upper_bound {
            if upper.is_nan() || upper <= self.lower_bound {
                return Err(CalibError::InvalidConfigError(format!(
                    "Upper bound {} should be greater than lower bound {}",
                    upper, self.lower_bound
                )));
            }
        }
        if self
            .initial_guess
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.)
        {
            return Err(CalibError::InvalidConfigError(format!(
                "Initial guess should be finite and strictly positive, got {:?}",
                self.initial_guess
            )));
        }
        if self.max_eval == 0 {
            return Err(CalibError::InvalidConfigError(
                "`max_eval` should be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a calibration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Calibrated hyperparameters, within bounds
    pub hyperparameters: Hyperparameters<f64>,
    /// SSE of the calibrated hyperparameters
    pub sse: f64,
    /// SSE of the initial guess
    pub initial_sse: f64,
    /// Whether the optimizer reported convergence
    pub converged: bool,
    /// Number of SSE evaluations
    pub n_evals: usize,
}

impl fmt::Display for CalibrationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} sse={} (initial sse={}, converged={}, evals={})",
            self.hyperparameters, self.sse, self.initial_sse, self.converged, self.n_evals
        )
    }
}

/// Calibrates kernel hyperparameters of a sliding-window GP by minimizing the
/// sum of squared prediction errors over a training dataset.
///
/// One optimization run is done per calibration, the best evaluated hyperparameters
/// are returned whatever the optimizer convergence status.
///
/// ```no_run
/// use linfa::ParamGuard;
/// use ndarray::{Array, Axis, concatenate};
/// use wingp_calib::{Algorithm, Calibrator};
/// use wingp_gp::WindowedGpParams;
///
/// let t = Array::linspace(0., 1., 50).insert_axis(Axis(1));
/// let y = t.mapv(|v: f64| (6. * v).sin());
/// let data = concatenate![Axis(1), t, y];
///
/// let params = WindowedGpParams::new(10).check().expect("valid parameters");
/// let res = Calibrator::new(params)
///     .configure(|config| config.algorithm(Algorithm::Cobyla).max_eval(100))
///     .calibrate(&data)
///     .expect("calibration");
/// println!("calibrated {}", res);
/// ```
pub struct Calibrator<K: Kernel<f64> = SquaredExponentialLinearKernel> {
    params: WindowedGpValidParams<f64, K>,
    config: CalibrationConfig,
    minimizer: Option<Box<dyn Minimizer>>,
}

impl<K: Kernel<f64>> Calibrator<K> {
    /// Constructor given window parameters, their hyperparameters are not used
    pub fn new(params: WindowedGpValidParams<f64, K>) -> Self {
        Calibrator {
            params,
            config: CalibrationConfig::default(),
            minimizer: None,
        }
    }

    /// Set configuration with a closure taking and returning a [`CalibrationConfig`]
    pub fn configure<F: FnOnce(CalibrationConfig) -> CalibrationConfig>(mut self, init: F) -> Self {
        self.config = init(self.config);
        self
    }

    /// Use a given minimizer instead of the configured optimizer backend
    pub fn minimizer(mut self, minimizer: Box<dyn Minimizer>) -> Self {
        self.minimizer = Some(minimizer);
        self
    }

    /// Calibration configuration
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Window parameters
    pub fn params(&self) -> &WindowedGpValidParams<f64, K> {
        &self.params
    }

    fn check_data(&self, data: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<()> {
        let window_size = self.params.window_size();
        if window_size >= data.nrows() {
            return Err(CalibError::InvalidConfigError(format!(
                "Window size {} should be smaller than dataset length {}",
                window_size,
                data.nrows()
            )));
        }
        if data.ncols() <= self.params.n_targets() {
            return Err(CalibError::InvalidConfigError(format!(
                "Dataset with {} column(s) has no feature column besides {} target(s)",
                data.ncols(),
                self.params.n_targets()
            )));
        }
        Ok(())
    }

    /// Calibrate hyperparameters on the normalized training `data`
    pub fn calibrate(&self, data: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<CalibrationResult> {
        self.config.check()?;
        self.check_data(data)?;

        let bounds = self.config.bounds();
        let x0 = crate::optimizers::clamp(&self.config.initial_guess, &bounds);
        let init = Hyperparameters::from_slice(&x0.to_vec())?;
        let objective = CalibrationObjective::new(data.view(), self.params.clone());
        let initial_sse = objective.sse(&init)?;
        info!(
            "Calibration start: window={}, rows={}, algorithm={:?}, initial {} sse={}",
            self.params.window_size(),
            data.nrows(),
            self.config.algorithm,
            init,
            initial_sse
        );

        let minimum = match &self.minimizer {
            Some(minimizer) => minimizer.minimize(&|x| objective.value(x), &x0.to_vec(), &bounds),
            None => Optimizer::new(self.config.algorithm)
                .max_eval(self.config.max_eval)
                .ftol_rel(self.config.ftol_rel)
                .ftol_abs(self.config.ftol_abs)
                .minimize(&|x| objective.value(x), &x0.to_vec(), &bounds),
        };
        if !minimum.converged {
            warn!(
                "Calibration optimizer did not converge after {} evaluations, best evaluated point kept",
                minimum.n_evals
            );
        }

        let in_bounds = |hp: &Hyperparameters<f64>| {
            hp.to_array()
                .iter()
                .zip(&bounds)
                .all(|(v, (lo, up))| v >= lo && v <= up)
        };
        let mut best = (init, initial_sse);
        let candidates = [
            Hyperparameters::from_slice(&minimum.x.to_vec())
                .ok()
                .map(|hp| (hp, minimum.fmin)),
            objective.best(),
        ];
        for (hp, sse) in candidates.into_iter().flatten() {
            if sse.is_finite() && sse < best.1 && in_bounds(&hp) {
                best = (hp, sse);
            }
        }
        let (hyperparameters, sse) = best;

        let res = CalibrationResult {
            hyperparameters,
            sse,
            initial_sse,
            converged: minimum.converged,
            n_evals: objective.n_evals(),
        };
        info!("Calibration end: {}", res);
        Ok(res)
    }
}
