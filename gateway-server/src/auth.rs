//! Optional bearer token gate
//!
//! When enabled, every gated route requires `Authorization: Bearer <token>`
//! with exactly the configured token. Rejections are answered with a 401
//! and a plain-text body before the request reaches any handler.

use crate::error::AuthError;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Token check shared by the gated routes
#[derive(Clone, Default)]
pub struct BearerAuth {
    token: Option<Arc<str>>,
}

impl BearerAuth {
    /// Let every request through
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Require `token`; an empty token disables the check
    pub fn new(token: impl AsRef<str>) -> Self {
        let token = token.as_ref();
        Self {
            token: (!token.is_empty()).then(|| Arc::from(token)),
        }
    }

    /// Build from an optional token, as computed by the configuration
    pub fn from_token(token: Option<String>) -> Self {
        token.map(Self::new).unwrap_or_default()
    }

    /// Whether requests are checked at all
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Check the request headers
    pub fn check(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let Some(expected) = &self.token else {
            return Ok(());
        };

        let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
        let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

        let parts: Vec<&str> = value.split(' ').collect();
        let [scheme, token] = parts.as_slice() else {
            return Err(AuthError::MalformedHeader);
        };
        if *scheme != "Bearer" {
            return Err(AuthError::MalformedHeader);
        }

        if secure_compare(token, expected) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Axum middleware enforcing [`BearerAuth`]
pub async fn require_bearer(State(auth): State<BearerAuth>, request: Request, next: Next) -> Response {
    match auth.check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            if err.is_missing() {
                debug!("Rejected {} {}: {}", request.method(), request.uri().path(), err);
            } else {
                warn!("Rejected {} {}: {}", request.method(), request.uri().path(), err);
            }
            err.into_response()
        }
    }
}

/// Compare two strings without short-circuiting on the first difference
fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}
