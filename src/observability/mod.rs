//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (request counter and latency histogram)
//!
//! Consumers:
//!     → stderr (tracing-subscriber fmt layer), keeping stdout for CLI output
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```

pub mod logging;
pub mod metrics;
