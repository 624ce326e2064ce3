//! Core systems for Horizon Grid.
//!
//! This crate provides the reactive primitives the table engine is built on:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Property System**: Values with change detection
//! - **Debounce Timers**: Keyed, cancellable one-shot timers driven by an
//!   explicit clock
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Debouncing
//!
//! Rescheduling a key replaces its timer, so a burst of events fires once.
//!
//! ```
//! use std::time::{Duration, Instant};
//! use horizon_grid_core::DebounceTimers;
//!
//! let mut timers = DebounceTimers::new();
//! let start = Instant::now();
//! let delay = Duration::from_millis(1500);
//!
//! timers.schedule("name", delay, start);
//! timers.schedule("name", delay, start + Duration::from_millis(400));
//!
//! assert!(timers.take_expired(start + delay).is_empty());
//! assert_eq!(timers.take_expired(start + Duration::from_millis(1900)), vec!["name"]);
//! ```

mod error;
pub mod logging;
pub mod property;
pub mod signal;
mod timer;

pub use error::{CoreError, Result, SignalError, TimerError};
pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use timer::{DebounceTimers, TimerId};
