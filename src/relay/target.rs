//! Target resolution.
//!
//! A relay endpoint either always talks to one configured upstream or takes
//! the upstream from the caller. Either way the URL must be absolute and use
//! `http` or `https` before anything is sent.

use url::Url;

use crate::relay::error::RelayError;

/// Where an endpoint gets its upstream URL from.
#[derive(Debug, Clone)]
pub enum TargetSource {
    /// The caller names the upstream (`?url=` or the POST body's `url`).
    CallerSupplied,
    /// Every request goes to the same upstream.
    Fixed(Url),
}

impl TargetSource {
    pub fn resolve(&self, supplied: Option<&str>) -> Result<Url, RelayError> {
        match self {
            TargetSource::CallerSupplied => parse_target(supplied),
            TargetSource::Fixed(url) => Ok(url.clone()),
        }
    }
}

/// Parse and check a target URL.
pub fn parse_target(raw: Option<&str>) -> Result<Url, RelayError> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(RelayError::Validation("URL parameter is required".to_string())),
    };

    let url = Url::parse(raw)
        .map_err(|_| RelayError::Validation(format!("Invalid URL format: {}", raw)))?;

    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        "http" | "https" => Err(RelayError::Validation(format!("Invalid URL format: {}", raw))),
        scheme => Err(RelayError::Validation(format!(
            "Unsupported URL scheme '{}': only http and https are allowed",
            scheme
        ))),
    }
}
