//! Error types for the gateway server

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use wasm_gateway_runtime::Error as RuntimeError;

/// Failure of one `POST /tools/call` request
///
/// Every variant ends the request with a 400 and the standard error
/// envelope; the display text is what the caller sees.
#[derive(Debug, Error)]
pub enum CallError {
    /// Body is too large or not JSON, or `name` is missing or not a string
    #[error("Invalid JSON payload: {0}")]
    MalformedRequest(String),

    /// Arguments could not be encoded for the plugin
    #[error("Error converting arguments to JSON: {0}")]
    ArgumentSerialization(#[source] serde_json::Error),

    /// The requested name cannot name a plugin
    #[error("Invalid tool name: {0}")]
    InvalidToolName(String),

    /// No plugin exists for the requested name
    #[error("Unknown tool: {0}")]
    ArtifactNotFound(String),

    /// The plugin could not be constructed
    #[error("Error when loading the WASM plugin: {0}")]
    Construction(#[source] RuntimeError),

    /// The plugin faulted, exited abnormally or ran out of time
    #[error("Error executing the WASM function: {0}")]
    Execution(#[source] RuntimeError),
}

impl CallError {
    /// Classify a registry failure
    pub fn from_load(err: RuntimeError) -> Self {
        if let RuntimeError::InvalidToolName { name, reason } = &err {
            Self::InvalidToolName(format!("'{name}': {reason}"))
        } else if err.is_not_found() {
            Self::ArtifactNotFound(err.to_string())
        } else {
            Self::Construction(err)
        }
    }

    /// Short machine-readable kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) | Self::InvalidToolName(_) => "malformed_request",
            Self::ArgumentSerialization(_) => "argument_serialization",
            Self::ArtifactNotFound(_) => "artifact_not_found",
            Self::Construction(_) | Self::Execution(_) => "execution_failure",
        }
    }
}

/// Bearer token check failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Authorization header is missing")]
    MissingHeader,

    /// Header is not `Bearer <token>`
    #[error("Invalid Authorization header format, expected 'Bearer <token>'")]
    MalformedHeader,

    /// Token does not match the configured one
    #[error("Invalid token")]
    InvalidToken,
}

impl AuthError {
    /// Whether credentials were absent rather than wrong
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingHeader)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// Invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// HTTPS enabled without a certificate or key path
    #[error("USE_HTTPS is set but {0} is not configured")]
    MissingTlsFile(&'static str),

    /// A numeric option is out of range
    #[error("Invalid value for {option}: {reason}")]
    InvalidValue {
        /// Option name
        option: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Host and port do not form a socket address
    #[error("Invalid listen address '{0}'")]
    InvalidAddress(String),

    /// The tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}
