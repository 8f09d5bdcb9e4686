//! Response shaping and error mapping.
//!
//! The generic proxy wraps every outcome in an [`Envelope`]. Fixed routes
//! relay the upstream JSON untouched and collapse failures to flat errors.

use std::any::Any;

use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::relay::{RelayError, UpstreamResponse};

/// Wrapper object of the generic proxy.
#[derive(Debug, Serialize, Default)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `2xx` upstream response, relayed with its own status.
pub fn relay_success(upstream: UpstreamResponse) -> Response {
    let envelope = Envelope {
        success: true,
        status: Some(upstream.status.as_u16()),
        data: Some(upstream.data().unwrap_or(Value::String(String::new()))),
        headers: Some(upstream.reduced_headers()),
        ..Default::default()
    };
    (upstream.status, Json(envelope)).into_response()
}

/// Map a relay failure onto the generic proxy's error taxonomy.
pub fn relay_error(err: RelayError) -> Response {
    let (status, envelope) = match err {
        RelayError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Envelope {
                error: Some("Bad Request"),
                message: Some(message),
                ..Default::default()
            },
        ),
        RelayError::UpstreamStatus { status, body } => (
            status,
            Envelope {
                status: Some(status.as_u16()),
                data: body,
                error: Some("External API Error"),
                message: Some(format!("Request failed with status code {}", status.as_u16())),
                ..Default::default()
            },
        ),
        RelayError::Unreachable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Envelope {
                error: Some("Service Unavailable"),
                message: Some("Unable to reach external API".to_string()),
                ..Default::default()
            },
        ),
        RelayError::Setup(message) => internal_error(message),
        RelayError::InvalidBody => (
            StatusCode::BAD_GATEWAY,
            Envelope {
                error: Some("Bad Gateway"),
                message: Some("Upstream returned a non-JSON response".to_string()),
                ..Default::default()
            },
        ),
    };
    (status, Json(envelope)).into_response()
}

fn internal_error(message: String) -> (StatusCode, Envelope) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Envelope {
            error: Some("Internal Server Error"),
            message: Some(message),
            ..Default::default()
        },
    )
}

/// Fixed route success: the upstream JSON body, byte for byte.
pub fn fixed_success(upstream: UpstreamResponse) -> Response {
    if serde_json::from_slice::<serde::de::IgnoredAny>(&upstream.body).is_err() {
        return fixed_error(RelayError::InvalidBody);
    }
    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        upstream.body,
    )
        .into_response()
}

/// Fixed routes hide the failure kind, except for a non-JSON body.
pub fn fixed_error(err: RelayError) -> Response {
    match err {
        RelayError::InvalidBody => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "Upstream returned a non-JSON response." })),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch data from upstream." })),
        )
            .into_response(),
    }
}

/// Renders a handler panic as the generic 500 envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");

    let (status, envelope) = internal_error("An unexpected error occurred".to_string());
    (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::HeaderMap;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn upstream(status: StatusCode, body: &'static str) -> UpstreamResponse {
        UpstreamResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn test_success_envelope_keeps_status() {
        let response = relay_success(upstream(StatusCode::CREATED, r#"{"id":7}"#));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "status": 201, "data": { "id": 7 }, "headers": {} })
        );
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let cases = [
            (RelayError::Validation("URL parameter is required".into()), 400, "Bad Request"),
            (
                RelayError::UpstreamStatus { status: StatusCode::NOT_FOUND, body: None },
                404,
                "External API Error",
            ),
            (RelayError::Unreachable("connection refused".into()), 503, "Service Unavailable"),
            (RelayError::Setup("invalid header name".into()), 500, "Internal Server Error"),
        ];

        for (err, status, label) in cases {
            let response = relay_error(err);
            assert_eq!(response.status().as_u16(), status);
            let body = body_json(response).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], label);
        }
    }

    #[tokio::test]
    async fn test_upstream_error_carries_body() {
        let response = relay_error(RelayError::UpstreamStatus {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: Some(json!({ "reason": "bad input" })),
        });
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["status"], 422);
        assert_eq!(body["data"], json!({ "reason": "bad input" }));
    }

    #[tokio::test]
    async fn test_fixed_route_mapping() {
        let ok = fixed_success(upstream(StatusCode::OK, r#"{"record":[1,2]}"#));
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_json(ok).await, json!({ "record": [1, 2] }));

        let not_json = fixed_success(upstream(StatusCode::OK, "<html></html>"));
        assert_eq!(not_json.status(), StatusCode::BAD_GATEWAY);

        let unreachable = fixed_error(RelayError::Unreachable("timeout".into()));
        assert_eq!(unreachable.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_panic_response() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal Server Error");
    }
}
