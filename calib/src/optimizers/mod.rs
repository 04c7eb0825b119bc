//! Bounded optimizers used to calibrate hyperparameters

mod optimizer;

pub use optimizer::*;
