//! Unified error types for the Verse client
//!
//! This module defines error types for each layer:
//! - `DomainError`: errors returned through the port traits
//! - `BackendError`: REST backend client errors
//! - `RealtimeError`: change-stream websocket errors
//! - `ConfigError`: environment configuration errors
//! - `FeedError`: application layer errors surfaced to the renderer

use thiserror::Error;

/// Domain layer errors - what ports report back to the application
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// REST backend client errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Unauthorized - invalid or expired token")]
    Unauthorized,

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<BackendError> for DomainError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unauthorized => DomainError::Unauthorized(e.to_string()),
            BackendError::Api { status: 404, message } => DomainError::NotFound(message),
            BackendError::Deserialization(msg) => DomainError::Validation(msg),
            other => DomainError::Backend(other.to_string()),
        }
    }
}

/// Realtime change-stream errors
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<RealtimeError> for DomainError {
    fn from(e: RealtimeError) -> Self {
        DomainError::Backend(e.to_string())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Application layer errors - what the feed synchronizer and services return
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// The result arrived after the view changed or a newer load superseded it
    #[error("Result discarded: view changed while the request was in flight")]
    Stale,

    #[error("No feed view is active")]
    Inactive,

    #[error("Sign in to do that")]
    Unauthorized,
}
