//! Outbound HTTP client.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use serde_json::{Map, Value};
use url::Url;

use crate::relay::error::RelayError;

/// A fully resolved outbound request.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub timeout: Duration,
}

/// What the upstream sent back, whatever its status.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// JSON if the body parses as JSON, a string otherwise, `None` if empty.
    pub fn data(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        Some(
            serde_json::from_slice(&self.body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned())),
        )
    }

    /// `content-type` and `content-length` only.
    pub fn reduced_headers(&self) -> Map<String, Value> {
        let mut reduced = Map::new();
        for name in [CONTENT_TYPE, CONTENT_LENGTH] {
            if let Some(value) = self.headers.get(&name).and_then(|v| v.to_str().ok()) {
                reduced.insert(name.as_str().to_string(), Value::String(value.to_string()));
            }
        }
        reduced
    }
}

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: reqwest::Client,
}

impl UpstreamClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self { inner })
    }

    /// Send a single attempt. Non-2xx statuses are returned, not errors; only
    /// failing to get a response at all is an error here.
    pub async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, RelayError> {
        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
