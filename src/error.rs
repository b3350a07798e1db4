//! Error types for the configuration registry.

use thiserror::Error;

/// Root error type for registry operations.
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// The project root cannot identify a project
    #[error("Invalid project root: {0}")]
    InvalidRoot(String),

    /// Profile store failure
    #[error("Profile store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid registry configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No async runtime is available to run background tasks
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
}

/// Errors raised by a profile store.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Profile name cannot be mapped to an artifact
    #[error("Invalid profile name: {0:?}")]
    InvalidProfileName(String),

    /// IO error while scanning or deleting artifacts
    #[error("IO error: {0}")]
    Io(String),

    /// The store is unavailable
    #[error("Profile store unavailable: {0}")]
    Unavailable(String),
}

/// Errors found while validating a [`RegistryConfig`](crate::RegistryConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value is empty
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// The profile directory escapes the project root
    #[error("Profile directory must be relative to the project root: {0}")]
    AbsoluteProfileDir(String),

    /// Subscription buffer of zero
    #[error("event buffer size must be greater than 0")]
    ZeroEventBuffer,
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type alias for profile store operations.
pub type StoreResult<T> = Result<T, StoreError>;
