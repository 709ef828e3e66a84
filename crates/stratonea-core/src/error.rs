//! Error types for the resilience layer
//!
//! Connectivity derivation never fails; these cover the plumbing around it
//! (configuration, host bridges, lifecycle misuse).

use thiserror::Error;

use crate::ObserverId;

/// Core resilience-layer errors
#[derive(Error, Debug)]
pub enum StratoneaError {
    // Monitor errors
    #[error("Unknown observer: {0}")]
    UnknownObserver(ObserverId),

    // Host bridge errors
    #[error("Invalid host input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging already initialised")]
    LoggingAlreadyInitialised,
}

/// Result type for resilience-layer operations
pub type StratoneaResult<T> = Result<T, StratoneaError>;
