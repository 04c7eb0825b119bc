use finitediff::FiniteDiff;
use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Optimization algorithms available to minimize the calibration objective
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// Derivative free constrained optimization by linear approximations
    Cobyla,
    /// Sequential least squares quadratic programming, gradients
    /// are approximated by central finite differences
    #[default]
    Slsqp,
}

/// Default maximum number of objective evaluations
pub const MAX_EVAL_DEFAULT: usize = 200;
/// Finite cap replacing an infinite upper bound for optimizer backends
pub const FINITE_UPPER_BOUND: f64 = 1e6;

/// Outcome of a minimization
#[derive(Clone, Debug, PartialEq)]
pub struct Minimum {
    /// Best point found, within bounds
    pub x: Array1<f64>,
    /// Objective value at `x`
    pub fmin: f64,
    /// Whether the backend met its convergence criteria before
    /// exhausting the evaluation budget
    pub converged: bool,
    /// Number of objective evaluations (finite difference evaluations excluded)
    pub n_evals: usize,
}

/// A bounded nonlinear minimization capability
pub trait Minimizer {
    /// Minimize `objective` starting from `x0` within `bounds` given as `(lower, upper)`
    /// per component, an upper bound may be infinite.
    fn minimize(&self, objective: &dyn Fn(&[f64]) -> f64, x0: &[f64], bounds: &[(f64, f64)])
        -> Minimum;
}

/// Facade for the optimization backends
#[derive(Clone, Debug)]
pub struct Optimizer {
    algo: Algorithm,
    max_eval: usize,
    ftol_abs: Option<f64>,
    ftol_rel: Option<f64>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::new(Algorithm::default())
    }
}

impl Optimizer {
    pub fn new(algo: Algorithm) -> Self {
        Optimizer {
            algo,
            max_eval: MAX_EVAL_DEFAULT,
            ftol_abs: None,
            ftol_rel: None,
        }
    }

    pub fn ftol_abs(mut self, ftol_abs: f64) -> Self {
        self.ftol_abs = Some(ftol_abs);
        self
    }

    pub fn ftol_rel(mut self, ftol_rel: f64) -> Self {
        self.ftol_rel = Some(ftol_rel);
        self
    }

    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algo
    }
}

/// Bounds with infinite upper values replaced by [`FINITE_UPPER_BOUND`]
fn finite_bounds(bounds: &[(f64, f64)]) -> Vec<(f64, f64)> {
    bounds
        .iter()
        .map(|&(lo, up)| {
            let up = if up.is_finite() {
                up
            } else {
                FINITE_UPPER_BOUND.max(lo)
            };
            (lo, up)
        })
        .collect()
}

/// Project `x` into `bounds`
pub fn clamp(x: &[f64], bounds: &[(f64, f64)]) -> Array1<f64> {
    x.iter()
        .zip(bounds)
        .map(|(v, (lo, up))| v.max(*lo).min(*up))
        .collect()
}

impl Minimizer for Optimizer {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        x0: &[f64],
        bounds: &[(f64, f64)],
    ) -> Minimum {
        let bounds = finite_bounds(bounds);
        let xinit = clamp(x0, &bounds).to_vec();
        let n_evals = Cell::new(0);
        let eval = |x: &[f64]| -> f64 {
            // backends may pass NaNs
            if x.iter().any(|v| v.is_nan()) {
                return f64::INFINITY;
            }
            let v = objective(x);
            if v.is_nan() {
                f64::INFINITY
            } else {
                v
            }
        };
        let fun = |x: &[f64]| -> f64 {
            n_evals.set(n_evals.get() + 1);
            eval(x)
        };

        let res = match self.algo {
            Algorithm::Cobyla => {
                let cons: Vec<&dyn cobyla::Func<()>> = vec![];
                cobyla::minimize(
                    |x: &[f64], _u: &mut ()| fun(x),
                    &xinit,
                    &bounds,
                    &cons,
                    (),
                    self.max_eval,
                    cobyla::RhoBeg::All(0.5),
                    Some(cobyla::StopTols {
                        ftol_rel: self.ftol_rel.unwrap_or(0.0),
                        ftol_abs: self.ftol_abs.unwrap_or(0.0),
                        ..cobyla::StopTols::default()
                    }),
                )
                .map(|(status, x_opt, y_opt)| {
                    debug!("Cobyla status {:?}", status);
                    (x_opt, y_opt)
                })
                .map_err(|(status, x_opt, _)| {
                    debug!("Cobyla failure status {:?}", status);
                    x_opt
                })
            }
            Algorithm::Slsqp => {
                let obj = |x: &[f64], gradient: Option<&mut [f64]>, _u: &mut ()| -> f64 {
                    if let Some(grad) = gradient {
                        let f = |x: &Vec<f64>| -> f64 { eval(x) };
                        grad[..].copy_from_slice(&x.to_vec().central_diff(&f));
                    }
                    fun(x)
                };
                let cons: Vec<fn(&[f64], Option<&mut [f64]>, &mut ()) -> f64> = vec![];
                slsqp::minimize(
                    obj,
                    &xinit,
                    &bounds,
                    &cons,
                    (),
                    self.max_eval,
                    Some(slsqp::StopTols {
                        ftol_rel: self.ftol_rel.unwrap_or(0.0),
                        ftol_abs: self.ftol_abs.unwrap_or(0.0),
                        ..slsqp::StopTols::default()
                    }),
                )
                .map(|(status, x_opt, y_opt)| {
                    debug!("Slsqp status {:?}", status);
                    (x_opt, y_opt)
                })
                .map_err(|(status, x_opt, _)| {
                    debug!("Slsqp failure status {:?}", status);
                    x_opt
                })
            }
        };

        let budget_left = n_evals.get() < self.max_eval;
        let (x_opt, fmin, success) = match res {
            Ok((x_opt, fmin)) => (x_opt, fmin, true),
            Err(x_opt) => (x_opt, f64::INFINITY, false),
        };
        let x = clamp(&x_opt, &bounds);
        let fmin = if success && x.iter().zip(&x_opt).all(|(a, b)| a == b) && !fmin.is_nan() {
            fmin
        } else {
            eval(&x.to_vec())
        };
        Minimum {
            x,
            fmin,
            converged: success && budget_left && fmin.is_finite(),
            n_evals: n_evals.get(),
        }
    }
}
