//! Outbound header construction.
//!
//! Layers, lowest precedence first:
//! 1. policy defaults (`User-Agent`, POST `Content-Type`, fixed-route headers)
//! 2. custom headers from the POST body
//! 3. allowlisted headers copied from the caller
//!
//! Each layer replaces same-named headers from the layer below.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde_json::{Map, Value};

use crate::config::schema::FixedRouteConfig;
use crate::relay::error::RelayError;

pub const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

const GET_FORWARDED: &[&str] = &["authorization", "x-api-key", "content-type"];
const POST_FORWARDED: &[&str] = &["authorization", "x-api-key"];

/// Which headers an endpoint sends upstream.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    defaults: HeaderMap,
    forwarded: &'static [&'static str],
}

impl HeaderPolicy {
    /// Generic `GET` relay: default agent, forwards `authorization`,
    /// `x-api-key` and `content-type`.
    pub fn proxy_get(user_agent: &str) -> Result<Self, RelayError> {
        let mut defaults = HeaderMap::new();
        defaults.insert(USER_AGENT, header_value(user_agent)?);
        Ok(Self {
            defaults,
            forwarded: GET_FORWARDED,
        })
    }

    /// Generic `POST` relay: default agent and JSON content type, forwards
    /// `authorization` and `x-api-key`.
    pub fn proxy_post(user_agent: &str) -> Result<Self, RelayError> {
        let mut defaults = HeaderMap::new();
        defaults.insert(USER_AGENT, header_value(user_agent)?);
        defaults.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(Self {
            defaults,
            forwarded: POST_FORWARDED,
        })
    }

    /// Fixed route: static headers plus an optional secret, nothing forwarded
    /// from the caller.
    pub fn fixed(
        route: &FixedRouteConfig,
        default_agent: &str,
        secret: Option<&str>,
    ) -> Result<Self, RelayError> {
        let mut defaults = HeaderMap::new();
        let agent = route.user_agent.as_deref().unwrap_or(default_agent);
        defaults.insert(USER_AGENT, header_value(agent)?);

        for (name, value) in &route.headers {
            defaults.insert(header_name(name)?, header_value(value)?);
        }

        if let (Some(name), Some(secret)) = (route.secret_header.as_deref(), secret) {
            let mut value = header_value(secret)?;
            value.set_sensitive(true);
            defaults.insert(header_name(name)?, value);
        }

        Ok(Self {
            defaults,
            forwarded: &[],
        })
    }

    /// Build the outbound headers for one request.
    pub fn build(
        &self,
        custom: Option<&Map<String, Value>>,
        caller: &HeaderMap,
    ) -> Result<HeaderMap, RelayError> {
        let mut headers = self.defaults.clone();

        for (name, value) in custom.into_iter().flatten() {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => header_value(s)?,
                Value::Number(_) | Value::Bool(_) => header_value(&value.to_string())?,
                _ => {
                    return Err(RelayError::Setup(format!(
                        "header '{}' must be a string, number or boolean",
                        name
                    )))
                }
            };
            headers.insert(header_name(name)?, value);
        }

        for name in self.forwarded {
            if let Some(value) = caller.get(*name) {
                headers.insert(HeaderName::from_static(name), value.clone());
            }
        }

        Ok(headers)
    }
}

fn header_name(name: &str) -> Result<HeaderName, RelayError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RelayError::Setup(format!("invalid header name '{}'", name)))
}

fn header_value(value: &str) -> Result<HeaderValue, RelayError> {
    HeaderValue::from_str(value)
        .map_err(|_| RelayError::Setup("invalid header value".to_string()))
}
