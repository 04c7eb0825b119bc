use thiserror::Error;

/// A result type for windowed GP regression algorithm
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when using [`SlidingWindowGp`](crate::SlidingWindowGp) or a windowed posterior computation
#[derive(Error, Debug)]
pub enum GpError {
    /// When the window configuration or the dataset layout cannot produce any window
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
    /// When the regularized kernel matrix of a given window cannot be factorized
    #[error("Kernel matrix of window predicting row {index} is not positive definite")]
    WindowFactorizationError {
        /// Row index of the predicted observation
        index: usize,
        /// Underlying factorization error
        #[source]
        source: linfa_linalg::LinalgError,
    },
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a sliding-window pass ran but every window was skipped
    #[error("No predictions produced: {0}")]
    NoPredictionError(String),
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}
