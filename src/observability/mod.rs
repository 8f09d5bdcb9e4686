//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and relay endpoints produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (per-endpoint outcome counters, upstream latency)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every request span
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
