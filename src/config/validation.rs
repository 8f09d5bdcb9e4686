//! Configuration validation.
//!
//! Serde handles syntax; this checks the values make sense together.
//! Returns every problem found, not just the first.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::RelayConfig;
use crate::relay::target::parse_target;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Paths the server always mounts itself.
const RESERVED_PATHS: &[&str] = &["/", "/health"];

pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }
    if config.timeouts.fixed_route_secs == 0 {
        errors.push(ValidationError::new("timeouts.fixed_route_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    let mut seen: HashSet<&str> = RESERVED_PATHS.iter().copied().collect();

    if config.proxy.enabled {
        check_path("proxy.path", &config.proxy.path, &mut seen, &mut errors);
    }

    for (i, route) in config.fixed_routes.iter().enumerate() {
        let field = |name: &str| format!("fixed_routes[{}].{}", i, name);

        check_path(&field("path"), &route.path, &mut seen, &mut errors);

        if let Err(e) = parse_target(Some(&route.target)) {
            errors.push(ValidationError::new(field("target"), e.to_string()));
        }

        if route.secret_env.is_some() && route.secret_header.is_none() {
            errors.push(ValidationError::new(
                field("secret_header"),
                "required when secret_env is set",
            ));
        }

        if route.timeout_secs == Some(0) {
            errors.push(ValidationError::new(field("timeout_secs"), "must be greater than 0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_path<'a>(
    field: &str,
    path: &'a str,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    if !path.starts_with('/') {
        errors.push(ValidationError::new(field, "must start with '/'"));
    } else if let Some(problem) = route_syntax_problem(path) {
        errors.push(ValidationError::new(field, problem));
    } else if !seen.insert(path) {
        errors.push(ValidationError::new(field, format!("'{}' is already mounted", path)));
    }
}

/// Relay paths are literal. Anything the router would read as a capture,
/// a wildcard or a legacy `:param` is refused here instead of panicking at
/// startup.
fn route_syntax_problem(path: &str) -> Option<&'static str> {
    if path.contains('{') || path.contains('}') {
        return Some("must not contain '{' or '}'");
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Some("segments must not start with ':' or '*'");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FixedRouteConfig;

    fn fixed(path: &str, target: &str) -> FixedRouteConfig {
        FixedRouteConfig {
            path: path.into(),
            target: target.into(),
            headers: Default::default(),
            secret_env: None,
            secret_header: None,
            user_agent: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.upstream_secs = 0;
        config.fixed_routes.push(fixed("getLeaderboard", "ftp://example.com"));

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "timeouts.upstream_secs",
                "fixed_routes[0].path",
                "fixed_routes[0].target",
            ]
        );
    }

    #[test]
    fn test_rejects_shadowed_paths() {
        let mut config = RelayConfig::default();
        config.fixed_routes.push(fixed("/health", "https://example.com"));
        config.fixed_routes.push(fixed("/api/proxy", "https://example.com"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message.contains("already mounted")));
    }

    #[test]
    fn test_rejects_router_syntax_in_paths() {
        let mut config = RelayConfig::default();
        config.proxy.path = "/api/{target".into();
        for path in ["/:board", "/files/*rest", "/{board}", "/scores}"] {
            config.fixed_routes.push(fixed(path, "https://example.com"));
        }

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "proxy.path",
                "fixed_routes[0].path",
                "fixed_routes[1].path",
                "fixed_routes[2].path",
                "fixed_routes[3].path",
            ]
        );
    }

    #[test]
    fn test_literal_paths_with_colons_inside_segments_are_fine() {
        let mut config = RelayConfig::default();
        config.fixed_routes.push(fixed("/v1/board:latest", "https://example.com"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_secret_env_requires_header() {
        let mut config = RelayConfig::default();
        let mut route = fixed("/getLeaderboard", "https://api.jsonbin.io/v3/b/abc/latest");
        route.secret_env = Some("JSONBIN_MASTER_KEY".into());
        config.fixed_routes.push(route);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "fixed_routes[0].secret_header");
    }
}
