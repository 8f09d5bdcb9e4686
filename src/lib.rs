//! HTTP relay library.
//!
//! Lets a client that cannot call a third-party API directly (cross-origin
//! rules, credentials it must not hold) reach it through this server.

// Core subsystems
pub mod config;
pub mod http;
pub mod relay;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
