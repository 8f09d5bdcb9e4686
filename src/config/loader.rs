//! Configuration loading from disk and the process environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {name}: {value}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the config file if one is given, otherwise start from defaults,
/// then apply `PORT` and `RELAY_LOG_LEVEL` from the environment.
pub fn load_with_env(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    if let Ok(port) = std::env::var("PORT") {
        apply_port(&mut config, &port)?;
    }
    if let Ok(level) = std::env::var("RELAY_LOG_LEVEL") {
        config.observability.log_level = level;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Replace the port of the configured bind address, keeping its host.
///
/// A blank `PORT` keeps the configured port. An unparsable bind address is
/// left alone so validation reports it.
pub fn apply_port(config: &mut RelayConfig, port: &str) -> Result<(), ConfigError> {
    let port = port.trim();
    if port.is_empty() {
        return Ok(());
    }
    let port: u16 = port.parse().map_err(|_| ConfigError::Env {
        name: "PORT",
        value: port.to_string(),
    })?;

    if let Ok(mut addr) = config.listener.bind_address.parse::<SocketAddr>() {
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    Ok(())
}
