//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Generic caller-supplied-target proxy endpoint.
    pub proxy: ProxyEndpointConfig,

    /// `GET /health` response settings.
    pub health: HealthConfig,

    /// `GET /` liveness text.
    pub liveness: LivenessConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Routes that always relay to one configured upstream.
    pub fixed_routes: Vec<FixedRouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for the generic proxy endpoint, in seconds.
    pub upstream_secs: u64,

    /// Default timeout for fixed routes that do not set their own, in seconds.
    pub fixed_route_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            fixed_route_secs: 15,
        }
    }
}

/// Generic proxy endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyEndpointConfig {
    /// Mount the `GET`/`POST` proxy endpoint.
    pub enabled: bool,

    /// Path the endpoint is mounted on.
    pub path: String,

    /// Default `User-Agent` sent upstream.
    pub user_agent: String,
}

impl Default for ProxyEndpointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/api/proxy".to_string(),
            user_agent: default_user_agent(),
        }
    }
}

pub(crate) fn default_user_agent() -> String {
    format!("api-relay/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    pub message: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            message: "Proxy server is running".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub message: String,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            message: "Relay server is up!".to_string(),
        }
    }
}

/// Cross-origin configuration. When enabled every origin is allowed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A route that always relays to one upstream URL.
///
/// ```toml
/// [[fixed_routes]]
/// path = "/getLeaderboard"
/// target = "https://api.jsonbin.io/v3/b/<bin-id>/latest"
/// secret_env = "JSONBIN_MASTER_KEY"
/// secret_header = "X-Master-Key"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FixedRouteConfig {
    /// Inbound path, e.g. `/getLeaderboard`.
    pub path: String,

    /// Upstream URL every request on this route is sent to.
    pub target: String,

    /// Static headers attached to the outbound request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Environment variable holding a secret header value.
    #[serde(default)]
    pub secret_env: Option<String>,

    /// Header name the secret is sent under.
    #[serde(default)]
    pub secret_header: Option<String>,

    /// Overrides the proxy's default `User-Agent` (e.g. a browser string).
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Outbound timeout in seconds; falls back to `timeouts.fixed_route_secs`.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
