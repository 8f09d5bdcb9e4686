//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, PORT / RELAY_LOG_LEVEL overrides)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the relay
//! ```
//!
//! # Design Decisions
//! - All fields have defaults, so the relay runs with no file at all
//! - Secrets are never stored in the file; fixed routes name an env var

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_with_env, ConfigError};
pub use schema::{FixedRouteConfig, ListenerConfig, LogFormat, RelayConfig};
