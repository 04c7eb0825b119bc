//! This library calibrates kernel hyperparameters `(length_scale, sigma_f, sigma_y)` of a
//! sliding-window gaussian process (see [wingp_gp]) by minimizing the sum of squared
//! one-step-ahead prediction errors over a training dataset.
//!
//! * [CalibrationObjective] maps hyperparameters to the SSE of a sliding-window pass,
//! * [Calibrator] runs one bounded optimization of that objective,
//!   SLSQP with finite difference gradients by default, COBYLA as an alternative
//!   (see [Algorithm]), any [Minimizer] can be plugged instead,
//! * [CalibratedModel] bundles calibrated hyperparameters with the normalization
//!   of raw data and can be saved to and loaded from json.
//!
//! # Example
//!
//! ```no_run
//! use linfa::ParamGuard;
//! use ndarray::{Array, Axis, concatenate};
//! use wingp_calib::{CalibratedModel, CalibrationConfig};
//! use wingp_gp::WindowedGpParams;
//!
//! let t = Array::linspace(0., 99., 100).insert_axis(Axis(1));
//! let y = t.mapv(|v: f64| 10. * (v / 5.).sin());
//! let data = concatenate![Axis(1), t, y];
//!
//! let params = WindowedGpParams::new(10).check().expect("valid parameters");
//! let model = CalibratedModel::fit(&data, params, CalibrationConfig::default())
//!     .expect("model calibrated");
//! let pred = model.predict(&data).expect("predictions");
//! println!("calibrated {}, {} predictions", model.hyperparameters(), pred.means.nrows());
//! ```
mod calibrator;
mod errors;
mod model;
mod objective;
mod optimizers;

pub use calibrator::*;
pub use errors::*;
pub use model::*;
pub use objective::*;
pub use optimizers::*;
