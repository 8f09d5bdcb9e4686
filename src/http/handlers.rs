//! Route handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::http::request::request_id;
use crate::http::response::{fixed_error, fixed_success, relay_error, relay_success};
use crate::relay::{InboundCall, RelayEndpoint, RelayError, UpstreamClient};

/// Query key carrying the caller-supplied target.
pub const URL_PARAM: &str = "url";

/// Shared state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: UpstreamClient,
    pub proxy_get: Arc<RelayEndpoint>,
    pub proxy_post: Arc<RelayEndpoint>,
    pub health_message: Arc<str>,
    pub liveness_message: Arc<str>,
    pub endpoints: Arc<[String]>,
}

/// JSON body accepted by `POST /api/proxy`. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProxyPostBody {
    pub url: Option<String>,
    pub data: Option<Value>,
    pub headers: Option<Map<String, Value>>,
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": &*state.health_message,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

pub async fn liveness(State(state): State<AppState>) -> String {
    state.liveness_message.to_string()
}

/// `GET /api/proxy?url=<target>&...`
pub async fn proxy_get(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let mut target = None;
    let mut query = Vec::with_capacity(params.len());
    for (key, value) in params {
        if key == URL_PARAM {
            if target.is_none() {
                target = Some(value);
            }
        } else {
            query.push((key, value));
        }
    }

    tracing::debug!(request_id = %request_id(&headers), "GET proxy request");

    let call = InboundCall {
        method: Method::GET,
        target,
        query,
        caller_headers: headers,
        ..Default::default()
    };

    match state.proxy_get.handle(&state.client, call).await {
        Ok(upstream) => relay_success(upstream),
        Err(e) => relay_error(e),
    }
}

/// `POST /api/proxy` with `{ url, data?, headers? }`.
pub async fn proxy_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    tracing::debug!(request_id = %request_id(&headers), "POST proxy request");

    let body: ProxyPostBody = if body.is_empty() {
        ProxyPostBody::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(request_id = %request_id(&headers), error = %e, "Rejected proxy body");
                return relay_error(RelayError::Validation(
                    "Request body must be a JSON object with a 'url' field".to_string(),
                ));
            }
        }
    };

    if body.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
        return relay_error(RelayError::Validation(
            "URL is required in request body".to_string(),
        ));
    }

    let call = InboundCall {
        method: Method::POST,
        target: body.url,
        body: body.data,
        custom_headers: body.headers,
        caller_headers: headers,
        ..Default::default()
    };

    match state.proxy_post.handle(&state.client, call).await {
        Ok(upstream) => relay_success(upstream),
        Err(e) => relay_error(e),
    }
}

/// `GET <fixed path>`: always the configured upstream, raw JSON back.
pub async fn fixed_route(client: UpstreamClient, endpoint: Arc<RelayEndpoint>) -> Response {
    let call = InboundCall {
        method: Method::GET,
        ..Default::default()
    };

    match endpoint.handle(&client, call).await {
        Ok(upstream) => {
            tracing::info!(endpoint = %endpoint.name, "Fetched upstream data");
            fixed_success(upstream)
        }
        Err(e) => fixed_error(e),
    }
}

/// Any unmatched path or method.
pub async fn not_found(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route Not Found",
            "message": format!("Route {} {} not found", method, uri.path()),
            "availableEndpoints": &*state.endpoints,
        })),
    )
        .into_response()
}
