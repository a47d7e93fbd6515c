//! Client error types

use thiserror::Error;
use wasm_gateway_protocol::ProtocolError;

/// Errors returned by [`GatewayClient`](crate::GatewayClient)
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL cannot be used
    #[error("Invalid gateway URL '{0}'")]
    InvalidUrl(String),

    /// The request could not be sent or the response could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The gateway answered with a status the operation does not accept
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, lossily decoded
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Invalid response: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(ProtocolError::Json(err))
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
