//! Error types for deployctl

use thiserror::Error;

/// Main error type for deployment runs
#[derive(Error, Debug)]
pub enum DeployError {
    /// Missing required field, malformed input line or unfulfilled request property
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Non-success response or transport failure talking to the deployment server
    #[error("Communication error: {0}")]
    CommunicationError(String),

    /// Terminal failure status, or the wait for one was interrupted
    #[error("Process failure: {0}")]
    ProcessFailureError(String),

    /// Post-deploy property harvest failed. Never fatal.
    #[error("Property harvest error: {0}")]
    PropertyHarvestError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        DeployError::CommunicationError(err.to_string())
    }
}
