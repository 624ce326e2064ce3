//! Logging facilities for Horizon Grid.
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid=debug")
//!     .init();
//! ```
//!
//! Every subsystem logs under a fixed target, listed in [`targets`], so a
//! single component can be traced in isolation.

use std::time::{Duration, Instant};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Debounce timer target.
    pub const TIMER: &str = "horizon_grid_core::timer";
    /// Column registry target.
    pub const COLUMNS: &str = "horizon_grid::columns";
    /// Row store target.
    pub const ROWS: &str = "horizon_grid::rows";
    /// Derivation pipeline target.
    pub const PIPELINE: &str = "horizon_grid::pipeline";
    /// Interaction controller target.
    pub const CONTROLLER: &str = "horizon_grid::controller";
    /// Configuration store target.
    pub const CONFIG: &str = "horizon_grid::config";
    /// Table session target.
    pub const SESSION: &str = "horizon_grid::session";
}

/// A guard for performance measurement spans.
///
/// The span stays entered until the guard is dropped. [`elapsed`](Self::elapsed)
/// reports the time since the span was opened.
///
/// ```ignore
/// let span = PerfSpan::new("derive");
/// // ... work ...
/// tracing::debug!(elapsed_us = span.elapsed().as_micros() as u64, "derived");
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
    started: Instant,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_grid::perf", "perf", operation = name);
        Self {
            span: span.entered(),
            started: Instant::now(),
        }
    }

    /// Time elapsed since the span was opened.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
