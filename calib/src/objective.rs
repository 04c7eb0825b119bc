use crate::errors::{CalibError, Result};

use log::debug;
use ndarray::{ArrayView2, Zip};
use std::cell::{Cell, RefCell};
use wingp_gp::kernels::Kernel;
use wingp_gp::{Hyperparameters, SlidingWindowGp, WindowedGpValidParams};

/// Sum of squared sliding-window prediction errors over a training dataset
/// as a function of kernel hyperparameters.
///
/// Every evaluation is recorded to keep track of the best evaluated point.
pub struct CalibrationObjective<'a, K: Kernel<f64>> {
    data: ArrayView2<'a, f64>,
    params: WindowedGpValidParams<f64, K>,
    n_evals: Cell<usize>,
    best: RefCell<Option<(Hyperparameters<f64>, f64)>>,
}

impl<'a, K: Kernel<f64>> CalibrationObjective<'a, K> {
    /// Constructor given a training dataset and window parameters.
    /// Hyperparameters held by `params` are ignored.
    pub fn new(data: ArrayView2<'a, f64>, params: WindowedGpValidParams<f64, K>) -> Self {
        CalibrationObjective {
            data,
            params,
            n_evals: Cell::new(0),
            best: RefCell::new(None),
        }
    }

    /// SSE between sliding-window predictions and actual targets of predicted rows.
    /// Rows with non finite actual targets do not contribute.
    pub fn sse(&self, hyperparameters: &Hyperparameters<f64>) -> Result<f64> {
        let gp = SlidingWindowGp::new(self.params.with_hyperparameters(*hyperparameters)?);
        let prediction = gp.predict(&self.data)?;
        let actual = gp.targets_of(&self.data, &prediction)?;
        let sse = Zip::from(prediction.predictions())
            .and(&actual)
            .fold(0., |acc, &p, &a| {
                if a.is_finite() {
                    acc + (p - a) * (p - a)
                } else {
                    acc
                }
            });
        self.record(hyperparameters, sse);
        Ok(sse)
    }

    /// Objective value at `x = [length_scale, sigma_f, sigma_y]` for the optimizer,
    /// failures and non finite values map to infinity
    pub fn value(&self, x: &[f64]) -> f64 {
        if x.iter().any(|v| v.is_nan()) {
            return f64::INFINITY;
        }
        let res = Hyperparameters::from_slice(x)
            .map_err(CalibError::from)
            .and_then(|hp| self.sse(&hp));
        match res {
            Ok(sse) if sse.is_finite() => sse,
            Ok(sse) => {
                debug!("Non finite SSE {} at {:?}", sse, x);
                f64::INFINITY
            }
            Err(err) => {
                debug!("SSE evaluation failed at {:?}: {}", x, err);
                f64::INFINITY
            }
        }
    }

    fn record(&self, hyperparameters: &Hyperparameters<f64>, sse: f64) {
        self.n_evals.set(self.n_evals.get() + 1);
        if !sse.is_finite() {
            return;
        }
        let mut best = self.best.borrow_mut();
        match *best {
            Some((_, fbest)) if fbest <= sse => (),
            _ => *best = Some((*hyperparameters, sse)),
        }
    }

    /// Number of successful SSE evaluations
    pub fn n_evals(&self) -> usize {
        self.n_evals.get()
    }

    /// Best evaluated hyperparameters and their SSE
    pub fn best(&self) -> Option<(Hyperparameters<f64>, f64)> {
        *self.best.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::{concatenate, Array, Axis};
    use wingp_gp::WindowedGpParams;

    fn linear_data() -> ndarray::Array2<f64> {
        let t = Array::linspace(0., 1., 20).insert_axis(Axis(1));
        let y = t.mapv(|v: f64| 2. * v + 1.);
        concatenate![Axis(1), t, y]
    }

    #[test]
    fn test_sse_non_negative() {
        let data = linear_data();
        let params = WindowedGpParams::new(5).check().unwrap();
        let obj = CalibrationObjective::new(data.view(), params);
        let sse = obj.sse(&Hyperparameters::default()).unwrap();
        assert!(sse >= 0.);
        assert_abs_diff_eq!(obj.value(&[1., 1., 0.1]), sse);
        assert_eq!(obj.n_evals(), 2);
    }

    #[test]
    fn test_value_failures_are_infinite() {
        let data = linear_data();
        let params = WindowedGpParams::new(5).check().unwrap();
        let obj = CalibrationObjective::new(data.view(), params);
        assert_eq!(obj.value(&[f64::NAN, 1., 0.1]), f64::INFINITY);
        assert_eq!(obj.value(&[1., -1., 0.1]), f64::INFINITY);
        assert_eq!(obj.value(&[1., 1.]), f64::INFINITY);
        assert!(obj.best().is_none());
    }

    #[test]
    fn test_best_is_tracked() {
        let data = linear_data();
        let params = WindowedGpParams::new(5).check().unwrap();
        let obj = CalibrationObjective::new(data.view(), params);
        let f1 = obj.value(&[1., 1., 0.1]);
        let f2 = obj.value(&[1., 1., 1e-3]);
        let (hp, fbest) = obj.best().unwrap();
        assert_abs_diff_eq!(fbest, f1.min(f2));
        let expected = if f1 <= f2 { 0.1 } else { 1e-3 };
        assert_abs_diff_eq!(hp.sigma_y(), expected);
    }
}
