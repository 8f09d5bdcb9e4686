//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound call (handler)
//!     → target.rs (caller-supplied or fixed URL, http/https check)
//!     → headers.rs (defaults → body headers → forwarded caller headers)
//!     → client.rs (single outbound attempt with a deadline)
//!     → endpoint.rs (classify: 2xx / upstream status / unreachable / setup)
//!     → http::response (envelope or raw body)
//! ```
//!
//! # Design Decisions
//! - One attempt per inbound request; no retry, no cache
//! - Requests share nothing but the pooled `reqwest::Client`
//! - Validation failures never reach the network

pub mod client;
pub mod endpoint;
pub mod error;
pub mod headers;
pub mod target;

pub use client::{UpstreamClient, UpstreamResponse};
pub use endpoint::{InboundCall, RelayEndpoint};
pub use error::RelayError;
pub use headers::HeaderPolicy;
pub use target::TargetSource;
