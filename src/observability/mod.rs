//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router operations produce:
//!     → events.rs (append-only, timestamped text log)
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//! ```
//!
//! # Design Decisions
//! - The event log is part of the router's observable state
//! - Tracing and metrics are fire-and-forget side channels

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventLog, LogEntry};
