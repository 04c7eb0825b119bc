//! This library implements sliding-window [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process)
//! regression over time-ordered datasets.
//!
//! For each time step a GP is conditioned on the `M` previous observations and predicts the
//! next one: posterior mean and standard deviation of every target.
//! Each window is a small exact GP solved from scratch with a Cholesky factorization
//! of the kernel matrix regularized by the observation noise.
//!
//! The sliding-window algorithm is implemented by [SlidingWindowGp] parameterized by [WindowedGpParams].
//! The default covariance kernel is the squared exponential plus linear kernel
//! (see [kernels::SquaredExponentialLinearKernel]).
//!
//! # Features
//!
//! ## serializable
//!
//! The `serializable` feature enables the serialization of parameters, kernels and
//! normalizers using the [`serde crate`](https://serde.rs/).
mod errors;
pub mod kernels;
pub mod metrics;
mod parameters;
mod posterior;
mod sliding;
mod utils;

pub use errors::*;
pub use parameters::*;
pub use posterior::*;
pub use sliding::*;
pub use utils::Normalizer;
