//! Error types for the Bantay client

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// Wire data violated the encoding contract (bad optional arity,
    /// bad variant key count, malformed record). Fatal to the whole decode.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The remote call could not complete (network, handshake, revoked
    /// credential).
    #[error("Transport error: {0}")]
    Transport(String),

    /// No usable session for an operation that requires one.
    #[error("No active session: {0}")]
    NoSession(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Protocol(err.to_string())
    }
}
