//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! router / load engine
//!     → logging.rs (tracing subscriber: env filter + fmt layer)
//!     → metrics.rs (counters, gauges, histograms through the metrics facade)
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or recorder is the
//!   binary's job
//! - Without a recorder installed every metric call is a no-op

pub mod logging;
pub mod metrics;
