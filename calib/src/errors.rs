use thiserror::Error;

/// A result type for hyperparameters calibration
pub type Result<T> = std::result::Result<T, CalibError>;

/// An error for hyperparameters calibration and calibrated model handling
#[derive(Error, Debug)]
pub enum CalibError {
    /// When configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
    /// When the sliding-window GP fails
    #[error(transparent)]
    GpError(#[from] wingp_gp::GpError),
    /// When IO fails
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    /// When model (de)serialization fails
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),
}
