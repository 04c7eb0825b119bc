//! `wingp` estimates time-varying targets (e.g. battery state of charge, average temperature)
//! from a stream of sensor observations with a sliding-window gaussian process whose kernel
//! hyperparameters are calibrated offline.
//!
//! This crate gathers:
//! * [gp]: kernels, windowed posterior and sliding-window evaluation,
//! * [calib]: hyperparameters calibration and calibrated model persistence.
//!
//! A `wingp` command line tool is also provided to calibrate a model on a training
//! dataset and predict on a test dataset, datasets being stored as `.npy` matrices
//! whose trailing columns are targets.
//!
//! ```no_run
//! use wingp::calib::{CalibratedModel, CalibrationConfig};
//! use wingp::gp::WindowedGpParams;
//! use wingp::ParamGuard;
//! use ndarray::{Array, Axis, concatenate};
//!
//! let t = Array::linspace(0., 99., 100).insert_axis(Axis(1));
//! let y = t.mapv(|v: f64| (v / 5.).sin());
//! let data = concatenate![Axis(1), t, y];
//!
//! let params = WindowedGpParams::new(10).check().expect("valid window parameters");
//! let model = CalibratedModel::fit(&data, params, CalibrationConfig::default())
//!     .expect("model calibrated");
//! println!("{}", model.hyperparameters());
//! ```

pub use linfa::ParamGuard;
pub use wingp_calib as calib;
pub use wingp_gp as gp;
