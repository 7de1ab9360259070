//! Error types for riskstream

/// Result type alias using riskstream's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for riskstream operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A signal source failed to produce a result
    #[error("signal error: {0}")]
    Signal(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// A factor name outside the known vocabulary or the active weight table
    #[error("unknown factor: {0}")]
    UnknownFactor(String),

    /// A weight outside [0, 1] or non-finite
    #[error("invalid weight for {factor}: {value}")]
    InvalidWeight { factor: String, value: f64 },

    /// Calibration fitting refused to produce a calibrator
    #[error("insufficient calibration data: {0}")]
    InsufficientCalibrationData(String),

    /// Labeled dataset problems
    #[error("dataset error: {0}")]
    Dataset(String),

    /// A referenced case could not be loaded
    #[error("failed to load case {path}: {reason}")]
    CaseLoad { path: String, reason: String },

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new signal error
    pub fn signal(msg: impl Into<String>) -> Self {
        Self::Signal(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new unknown factor error
    pub fn unknown_factor(name: impl Into<String>) -> Self {
        Self::UnknownFactor(name.into())
    }

    /// Create a new insufficient calibration data error
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientCalibrationData(msg.into())
    }

    /// Create a new dataset error
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Create a new case load error
    pub fn case_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CaseLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
