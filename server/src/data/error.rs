//! Error types for the data layer
//!
//! `DataError` covers the profile source (the monitored database),
//! `MetricsError` covers the Prometheus registry.

use thiserror::Error;

/// Error talking to the monitored database
#[derive(Error, Debug)]
pub enum DataError {
    /// MongoDB driver error (query, cursor, command)
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Initial connection could not be established
    #[error("Connection to {target} failed: {reason}")]
    Connection { target: String, reason: String },

    /// Backend not available (used by in-memory sources in tests)
    #[error("Backend {backend} is not available: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },
}

/// Error registering or encoding metrics
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Encoded exposition was not valid UTF-8
    #[error("Invalid exposition encoding: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
