//! Keyed debounce timers.
//!
//! [`DebounceTimers`] holds one-shot timers tied to a resource key. At most
//! one timer is live per key: scheduling again for the same key cancels the
//! outstanding timer and arms a new one. This is the building block for
//! deferred-write coalescing, where a burst of events produces a single write
//! once the events pause.
//!
//! Timers never read the wall clock on their own. Every call takes the current
//! [`Instant`] from the caller, so the owner of the event loop decides when
//! time advances (and tests can step it deterministically).
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use horizon_grid_core::DebounceTimers;
//!
//! let mut timers = DebounceTimers::new();
//! let start = Instant::now();
//!
//! timers.schedule("width", Duration::from_millis(100), start);
//! timers.schedule("width", Duration::from_millis(100), start + Duration::from_millis(50));
//!
//! assert!(timers.take_expired(start + Duration::from_millis(120)).is_empty());
//! assert_eq!(timers.take_expired(start + Duration::from_millis(150)), vec!["width"]);
//! ```

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, TimerError};

new_key_type! {
    /// A unique identifier for a scheduled timer.
    pub struct TimerId;
}

/// Internal timer data.
#[derive(Debug)]
struct TimerData<K> {
    key: K,
    fire_at: Instant,
}

/// An entry in the timer queue (min-heap by fire time, then by schedule order).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_at: Instant,
    seq: u64,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// One-shot timers keyed by a resource, at most one live timer per key.
pub struct DebounceTimers<K> {
    /// All live timers.
    timers: SlotMap<TimerId, TimerData<K>>,
    /// Priority queue of pending fires. Entries for cancelled timers are
    /// skipped lazily.
    queue: BinaryHeap<TimerQueueEntry>,
    /// The live timer for each key.
    by_key: HashMap<K, TimerId>,
    next_seq: u64,
}

impl<K: Clone + Eq + Hash + fmt::Debug> DebounceTimers<K> {
    /// Create an empty timer set.
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
            by_key: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Arm a timer for `key` that fires `delay` after `now`.
    ///
    /// Any timer already pending for the same key is cancelled first.
    pub fn schedule(&mut self, key: K, delay: Duration, now: Instant) -> TimerId {
        if let Some(previous) = self.by_key.remove(&key) {
            self.timers.remove(previous);
            tracing::trace!(target: "horizon_grid_core::timer", ?key, "rescheduling pending timer");
        }

        let fire_at = now + delay;
        let id = self.timers.insert(TimerData {
            key: key.clone(),
            fire_at,
        });
        self.queue.push(TimerQueueEntry {
            id,
            fire_at,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.by_key.insert(key, id);
        id
    }

    /// Cancel the pending timer for `key`.
    ///
    /// Returns the cancelled timer's ID, or an error if nothing was pending.
    pub fn cancel(&mut self, key: &K) -> Result<TimerId> {
        let id = self
            .by_key
            .remove(key)
            .ok_or_else(|| TimerError::NoPendingTimer(format!("{key:?}")))?;
        self.timers.remove(id);
        tracing::trace!(target: "horizon_grid_core::timer", ?key, "timer cancelled");
        Ok(id)
    }

    /// Stop a timer by its ID.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        let data = self.timers.remove(id).ok_or(TimerError::InvalidTimerId)?;
        self.by_key.remove(&data.key);
        Ok(())
    }

    /// Check whether a timer is pending for `key`.
    pub fn is_pending(&self, key: &K) -> bool {
        self.by_key.contains_key(key)
    }

    /// Get the duration from `now` until the next timer fires, if any.
    pub fn time_until_next(&mut self, now: Instant) -> Option<Duration> {
        self.discard_stale();
        self.queue
            .peek()
            .map(|entry| entry.fire_at.saturating_duration_since(now))
    }

    /// Remove and return the keys of all timers due at `now`, earliest first.
    #[tracing::instrument(skip(self), target = "horizon_grid_core::timer", level = "trace")]
    pub fn take_expired(&mut self, now: Instant) -> Vec<K> {
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek() {
            if entry.fire_at > now {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };

            // Cancelled or rescheduled timers leave stale queue entries behind.
            let Some(data) = self.timers.remove(entry.id) else {
                continue;
            };
            self.by_key.remove(&data.key);
            tracing::trace!(target: "horizon_grid_core::timer", key = ?data.key, "timer fired");
            fired.push(data.key);
        }

        fired
    }

    /// Get the number of pending timers.
    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// Drop every pending timer without firing it. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.timers.len();
        self.timers.clear();
        self.by_key.clear();
        self.queue.clear();
        dropped
    }

    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug> Default for DebounceTimers<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for DebounceTimers<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebounceTimers")
            .field("pending", &self.timers.len())
            .finish()
    }
}
