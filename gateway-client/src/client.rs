//! HTTP client for the gateway endpoints

use crate::error::{ClientError, Result};
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use wasm_gateway_protocol::{
    CallToolRequest, CallToolResponse, FunctionTool, ListToolsResponse, translate,
    translate_tools,
};

/// Client for one gateway instance
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GatewayClient {
    /// Client for the gateway at `base_url`, e.g. `http://localhost:8080`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Self::with_client(http, base_url)
    }

    /// Use a preconfigured reqwest client
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let trimmed = base_url.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url));
        }

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Gateway base URL, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw catalog bytes as served by `GET /tools/list`
    pub async fn list_tools_raw(&self) -> Result<Bytes> {
        let response = self.send(self.http.get(self.endpoint("/tools/list"))).await?;
        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?),
            status => Err(unexpected(status, response).await),
        }
    }

    /// Parsed tool catalog
    pub async fn list_tools(&self) -> Result<ListToolsResponse> {
        let raw = self.list_tools_raw().await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Catalog translated to function-calling definitions
    pub async fn function_tools(&self) -> Result<Vec<FunctionTool>> {
        let catalog = self.list_tools().await?;
        Ok(translate_tools(&catalog.result.tools))
    }

    /// Catalog translated to the function-calling JSON document
    pub async fn function_tools_json(&self) -> Result<Vec<u8>> {
        let raw = self.list_tools_raw().await?;
        Ok(translate(&raw)?)
    }

    /// Call a tool
    ///
    /// Tool failures come back as an envelope with `isError` set, not as an
    /// `Err`; only transport, auth and protocol problems are errors here.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResponse> {
        debug!("Calling {} with {}", name, arguments);
        let request = CallToolRequest::new(name, arguments);
        let response = self
            .send(self.http.post(self.endpoint("/tools/call")).json(&request))
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::BAD_REQUEST => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice(&body)?)
            }
            status => Err(unexpected(status, response).await),
        }
    }

    /// Whether `GET /health` answers 200
    pub async fn health(&self) -> Result<bool> {
        let response = self.http.get(self.endpoint("/health")).send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Unauthorized(body));
        }
        Ok(response)
    }
}

async fn unexpected(status: StatusCode, response: Response) -> ClientError {
    let body = response
        .bytes()
        .await
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default();
    ClientError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    }
}
