//! Error types for the Stratlab backtest engine.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    /// A strategy parameter failed validation. Raised before a run starts.
    #[error("Invalid parameter '{field}': {message}")]
    InvalidParameters { field: String, message: String },

    /// Unknown strategy, timeframe or other identifier.
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// A strategy failed while analyzing a bar.
    #[error("Strategy '{strategy}' failed: {message}")]
    Strategy { strategy: String, message: String },

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Market data error: {0}")]
    DataSource(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Backtest run {0} is already executing")]
    RunInProgress(Uuid),

    #[error("Backtest run was cancelled")]
    Cancelled,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Shorthand for a field-specific parameter rejection.
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a failure raised from inside a strategy.
    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
