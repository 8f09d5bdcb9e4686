//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_termination() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → RelayServer::run stops serving → process exits
//! ```
//!
//! # Design Decisions
//! - The server handle is owned by `main`, never stored globally
//! - No draining: in-flight relays are dropped with the runtime

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_termination;
