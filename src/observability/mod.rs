//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gate and upstream produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every admitted request's span
//! - Metrics are cheap (atomic increments) and off by default

pub mod logging;
pub mod metrics;
