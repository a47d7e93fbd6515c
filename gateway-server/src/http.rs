//! HTTP protocol bridge
//!
//! `GET /tools/list` serves the catalog as loaded. `POST /tools/call` walks
//! one request through parse, extract, serialize, load, invoke and
//! assemble; any failing step ends the request with a 400 and the error
//! envelope, success ends it with a 200.

use crate::auth::{BearerAuth, require_bearer};
use crate::error::CallError;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{StatusCode, header::CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Router, middleware};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;
use wasm_gateway_protocol::{CallToolResponse, JSON_CONTENT_TYPE, ToolCatalog};
use wasm_gateway_runtime::{Executor, PluginRegistry, ToolName};

/// State shared by the handlers
#[derive(Debug, Clone)]
pub struct AppState {
    catalog: Arc<ToolCatalog>,
    registry: Arc<PluginRegistry>,
    executor: Executor,
}

impl AppState {
    /// Bundle the catalog, registry and executor
    pub fn new(catalog: ToolCatalog, registry: PluginRegistry, executor: Executor) -> Self {
        Self {
            catalog: Arc::new(catalog),
            registry: Arc::new(registry),
            executor,
        }
    }

    /// Catalog being served
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Plugin registry
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }
}

/// Build the gateway router
///
/// The tool endpoints sit behind `auth`; `/health` does not.
pub fn router(state: AppState, auth: BearerAuth) -> Router {
    if auth.is_enabled() {
        info!("Bearer authentication enabled");
    }

    let tools = Router::new()
        .route("/tools/list", get(list_tools))
        .route("/tools/call", post(call_tool))
        .route_layer(middleware::from_fn_with_state(auth, require_bearer))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .merge(tools)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "OK"
}

async fn list_tools(State(state): State<AppState>) -> Response {
    debug!("Serving catalog with {} tools", state.catalog.len());
    (
        [(CONTENT_TYPE, JSON_CONTENT_TYPE)],
        state.catalog.raw().clone(),
    )
        .into_response()
}

async fn call_tool(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("tool_call", %request_id);

    async move {
        let outcome = match body {
            Ok(body) => dispatch(&state, &body).await,
            Err(rejection) => Err(CallError::MalformedRequest(rejection.body_text())),
        };
        match outcome {
            Ok(text) => envelope(StatusCode::OK, CallToolResponse::success(text)),
            Err(err) => {
                warn!(kind = err.kind(), "Tool call failed: {}", err);
                envelope(StatusCode::BAD_REQUEST, CallToolResponse::error(err.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}

/// Run one call through to its output text
async fn dispatch(state: &AppState, body: &[u8]) -> Result<String, CallError> {
    let request: Value =
        serde_json::from_slice(body).map_err(|e| CallError::MalformedRequest(e.to_string()))?;

    let (name, arguments) = extract_call(request)?;
    info!(tool = %name, "🚀 Calling tool with {}", arguments);

    let input = serde_json::to_vec(&arguments).map_err(CallError::ArgumentSerialization)?;

    let tool = ToolName::parse(&name).map_err(CallError::from_load)?;
    if !state.catalog.contains(tool.as_str()) {
        return Err(CallError::ArtifactNotFound(format!(
            "'{tool}' is not in the tool catalog"
        )));
    }
    let lease = state
        .registry
        .get_or_load(&tool)
        .await
        .map_err(CallError::from_load)?;

    let output = state
        .executor
        .invoke(&lease, input)
        .await
        .map_err(CallError::Execution)?;
    drop(lease);

    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Pull `name` and `arguments` out of the request object
///
/// A missing `arguments` field is forwarded as `null`.
fn extract_call(request: Value) -> Result<(String, Value), CallError> {
    let Value::Object(mut fields) = request else {
        return Err(CallError::MalformedRequest(
            "expected a JSON object".to_string(),
        ));
    };

    let name = match fields.remove("name") {
        Some(Value::String(name)) => name,
        Some(_) => {
            return Err(CallError::MalformedRequest(
                "\"name\" must be a string".to_string(),
            ));
        }
        None => {
            return Err(CallError::MalformedRequest(
                "\"name\" is required".to_string(),
            ));
        }
    };
    let arguments = fields.remove("arguments").unwrap_or(Value::Null);

    Ok((name, arguments))
}

fn envelope(status: StatusCode, response: CallToolResponse) -> Response {
    match serde_json::to_vec(&response) {
        Ok(body) => (status, [(CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("Failed to encode response envelope: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
