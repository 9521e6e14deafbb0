//! Error types for lynk-core

use thiserror::Error;

use crate::auth::AuthError;

/// Result type alias using lynk-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lynk-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication error
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store rejected the request
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
