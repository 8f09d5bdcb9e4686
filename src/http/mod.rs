//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, CORS, request ID, tracing, panic guard)
//!     → request.rs (request ID generation)
//!     → handlers.rs (extract target / query / body / caller headers)
//!     → relay endpoint (outbound call)
//!     → response.rs (envelope or raw body, error mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RelayRequestId, X_REQUEST_ID};
pub use server::{RelayServer, ServerError};
