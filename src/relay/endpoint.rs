//! One relay endpoint: resolve the target, build headers, send once, classify.

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::relay::client::{OutboundRequest, UpstreamClient, UpstreamResponse};
use crate::relay::error::RelayError;
use crate::relay::headers::HeaderPolicy;
use crate::relay::target::TargetSource;

/// A configured relay: where it sends, what it sends, and how long it waits.
#[derive(Debug, Clone)]
pub struct RelayEndpoint {
    /// Label for logs and metrics.
    pub name: String,
    pub target: TargetSource,
    pub headers: HeaderPolicy,
    pub timeout: Duration,
}

/// The parts of an inbound request a relay cares about.
#[derive(Debug, Default)]
pub struct InboundCall {
    pub method: Method,
    pub target: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub custom_headers: Option<Map<String, Value>>,
    pub caller_headers: HeaderMap,
}

impl RelayEndpoint {
    /// Relay one inbound call. `Ok` only for a 2xx upstream response.
    pub async fn handle(
        &self,
        client: &UpstreamClient,
        call: InboundCall,
    ) -> Result<UpstreamResponse, RelayError> {
        let result = self.forward(client, call).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::record_outcome(&self.name, outcome);

        result
    }

    async fn forward(
        &self,
        client: &UpstreamClient,
        call: InboundCall,
    ) -> Result<UpstreamResponse, RelayError> {
        let url = self.target.resolve(call.target.as_deref())?;
        let headers = self
            .headers
            .build(call.custom_headers.as_ref(), &call.caller_headers)?;
        let body = encode_body(call.body)?;

        tracing::info!(
            endpoint = %self.name,
            method = %call.method,
            url = %url,
            "Forwarding request"
        );

        let request = OutboundRequest {
            method: call.method,
            url,
            headers,
            query: call.query,
            body,
            timeout: self.timeout,
        };

        let start = Instant::now();
        let sent = client.send(request).await;
        metrics::record_upstream_latency(&self.name, start);

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(endpoint = %self.name, error = %e, "Upstream request failed");
                return Err(e);
            }
        };

        if !response.status.is_success() {
            tracing::error!(
                endpoint = %self.name,
                status = %response.status,
                "Upstream returned an error status"
            );
            return Err(RelayError::UpstreamStatus {
                status: response.status,
                body: response.data(),
            });
        }

        tracing::debug!(endpoint = %self.name, status = %response.status, "Upstream responded");
        Ok(response)
    }
}

/// Strings go out as-is, everything else as JSON. `null` means no body.
fn encode_body(body: Option<Value>) -> Result<Option<Bytes>, RelayError> {
    match body {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(Bytes::from(s))),
        Some(value) => serde_json::to_vec(&value)
            .map(|bytes| Some(Bytes::from(bytes)))
            .map_err(|e| RelayError::Setup(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::json;

    fn proxy_endpoint() -> RelayEndpoint {
        RelayEndpoint {
            name: "proxy".into(),
            target: TargetSource::CallerSupplied,
            headers: HeaderPolicy::proxy_get("relay-test").unwrap(),
            timeout: Duration::from_secs(1),
        }
    }

    /// Run one relay call against a private recorder and return the rendered
    /// Prometheus text.
    fn render_after(target: String) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let client = UpstreamClient::new().unwrap();
                let call = InboundCall {
                    method: Method::GET,
                    target: Some(target),
                    ..Default::default()
                };
                let _ = proxy_endpoint().handle(&client, call).await;
            })
        });
        handle.render()
    }

    #[test]
    fn test_encode_body() {
        assert_eq!(encode_body(None).unwrap(), None);
        assert_eq!(encode_body(Some(Value::Null)).unwrap(), None);
        assert_eq!(
            encode_body(Some(json!({ "x": 1 }))).unwrap(),
            Some(Bytes::from_static(br#"{"x":1}"#))
        );
        assert_eq!(
            encode_body(Some(json!("raw text"))).unwrap(),
            Some(Bytes::from_static(b"raw text"))
        );
    }

    #[tokio::test]
    async fn test_validation_fails_before_sending() {
        let endpoint = proxy_endpoint();
        let client = UpstreamClient::new().unwrap();

        let call = InboundCall {
            method: Method::GET,
            target: Some("not a url".into()),
            ..Default::default()
        };
        let err = endpoint.handle(&client, call).await.unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn test_rejected_target_counts_but_is_not_timed() {
        let rendered = render_after("not a url".into());
        assert!(rendered.contains("relay_requests_total"));
        assert!(rendered.contains(r#"outcome="invalid_request""#));
        assert!(!rendered.contains("relay_upstream_duration_seconds"));
    }

    #[test]
    fn test_sent_request_is_timed_even_when_it_fails() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let rendered = render_after(format!("http://{}/gone", addr));
        assert!(rendered.contains("relay_requests_total"));
        assert!(rendered.contains("relay_upstream_duration_seconds"));
    }
}
