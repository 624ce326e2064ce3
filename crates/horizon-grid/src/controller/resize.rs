//! Column resize drags with a debounced width commit.
//!
//! Pointer moves only update the pending width shown while dragging. The
//! committed width in the [`ColumnRegistry`] is written once the column has
//! seen no resize event for [`RESIZE_COMMIT_DELAY`].
//!
//! Time is passed in explicitly, so the host drives commits by calling
//! [`ResizeController::poll`] from its event loop, using
//! [`ResizeController::time_until_next_commit`] to pick a wake-up time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use horizon_grid_core::DebounceTimers;
use serde::Serialize;

use crate::column::ColumnRegistry;
use crate::error::{Result, TableError};

/// Quiet period after the last resize event before the width is committed.
pub const RESIZE_COMMIT_DELAY: Duration = Duration::from_millis(1500);

/// Resize state of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePhase {
    /// No resize in progress.
    #[default]
    Idle,
    /// The pointer is held on the column's resize handle.
    Dragging,
    /// The pointer was released; the commit is scheduled.
    Committing,
}

#[derive(Debug, Clone)]
struct ResizeDrag {
    /// Width the drag started from.
    start_width: f32,
    /// Live width, not yet committed.
    pending_width: f32,
    held: bool,
    /// Time of the last move whose width is not committed yet.
    last_move: Option<Instant>,
}

/// Tracks resize drags for every column of a session.
#[derive(Debug)]
pub struct ResizeController {
    drags: HashMap<String, ResizeDrag>,
    timers: DebounceTimers<String>,
    delay: Duration,
}

impl Default for ResizeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizeController {
    pub fn new() -> Self {
        Self::with_delay(RESIZE_COMMIT_DELAY)
    }

    /// Use a different quiet period before commits.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            drags: HashMap::new(),
            timers: DebounceTimers::new(),
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start dragging a column's resize handle.
    ///
    /// A drag on a column whose commit is still pending starts from the
    /// pending width as displayed (clamped) and cancels the pending commit.
    /// Releasing it without a move re-arms that commit.
    pub fn try_begin(&mut self, column: &str, columns: &ColumnRegistry) -> Result<f32> {
        let definition = columns
            .get(column)
            .ok_or_else(|| TableError::unknown_column(column))?;

        if self.timers.cancel(&column.to_string()).is_ok() {
            tracing::debug!(target: "horizon_grid::controller", %column, "pending width commit canceled by new drag");
        }
        let (start_width, last_move) = match self.drags.get(column) {
            Some(drag) => (definition.clamp_width(drag.pending_width), drag.last_move),
            None => (definition.width, None),
        };
        self.drags.insert(
            column.to_string(),
            ResizeDrag {
                start_width,
                pending_width: start_width,
                held: true,
                last_move,
            },
        );
        tracing::trace!(target: "horizon_grid::controller", %column, start_width, "resize started");
        Ok(start_width)
    }

    /// Start a drag; an unknown column is logged and ignored.
    pub fn begin(&mut self, column: &str, columns: &ColumnRegistry) {
        if let Err(err) = self.try_begin(column, columns) {
            tracing::warn!(target: "horizon_grid::controller", %err, "begin_resize ignored");
        }
    }

    /// Apply a pointer move. `cumulative_delta` is measured from where the
    /// drag began. Returns the new pending width.
    ///
    /// Each move cancels the pending commit and schedules a new one.
    pub fn pointer_move(&mut self, column: &str, cumulative_delta: f32, now: Instant) -> Option<f32> {
        let Some(drag) = self.drags.get_mut(column) else {
            tracing::debug!(target: "horizon_grid::controller", %column, "pointer move without an active resize");
            return None;
        };
        drag.pending_width = drag.start_width + cumulative_delta;
        drag.last_move = Some(now);
        let width = drag.pending_width;
        self.timers.schedule(column.to_string(), self.delay, now);
        Some(width)
    }

    /// Release the pointer. The scheduled commit stays in place.
    ///
    /// A drag that carried an uncommitted width over from an earlier drag
    /// and was released without moving gets its commit re-armed, timed from
    /// the last move.
    pub fn release(&mut self, column: &str) {
        let key = column.to_string();
        let Some(drag) = self.drags.get_mut(column) else {
            return;
        };
        if !self.timers.is_pending(&key) {
            let Some(last_move) = drag.last_move else {
                // Nothing left to commit.
                self.drags.remove(column);
                return;
            };
            tracing::debug!(target: "horizon_grid::controller", %column, "re-arming width commit");
            self.timers.schedule(key, self.delay, last_move);
        }
        drag.held = false;
    }

    /// Drop a column's drag and pending commit. Returns the discarded width.
    pub fn cancel(&mut self, column: &str) -> Option<f32> {
        if self.timers.cancel(&column.to_string()).is_ok() {
            tracing::debug!(target: "horizon_grid::controller", %column, "pending width commit canceled");
        }
        self.drags.remove(column).map(|drag| drag.pending_width)
    }

    /// Commit every column whose quiet period has elapsed.
    ///
    /// Returns the committed `(column, width)` pairs in firing order.
    pub fn poll(&mut self, now: Instant, columns: &mut ColumnRegistry) -> Vec<(String, f32)> {
        let mut committed = Vec::new();
        for column in self.timers.take_expired(now) {
            let Some(drag) = self.drags.get_mut(&column) else {
                continue;
            };
            let width = drag.pending_width;
            drag.last_move = None;
            // A held pointer keeps the drag alive for later moves.
            if !drag.held {
                self.drags.remove(&column);
            }
            if let Some(width) = columns.commit_width(&column, width) {
                committed.push((column, width));
            }
        }
        committed
    }

    /// The live width of a column being resized.
    pub fn pending_width(&self, column: &str) -> Option<f32> {
        self.drags.get(column).map(|drag| drag.pending_width)
    }

    pub fn phase(&self, column: &str) -> ResizePhase {
        match self.drags.get(column) {
            None => ResizePhase::Idle,
            Some(drag) if drag.held => ResizePhase::Dragging,
            Some(_) => ResizePhase::Committing,
        }
    }

    /// Time until the earliest scheduled commit.
    pub fn time_until_next_commit(&mut self, now: Instant) -> Option<Duration> {
        self.timers.time_until_next(now)
    }

    /// Number of scheduled commits.
    pub fn pending_commits(&self) -> usize {
        self.timers.pending_count()
    }

    /// Columns with a drag or pending commit, with their live widths.
    pub fn sizing_state(&self) -> impl Iterator<Item = (&str, f32)> {
        self.drags
            .iter()
            .map(|(column, drag)| (column.as_str(), drag.pending_width))
    }

    /// Drop every drag and pending commit without committing. Returns how
    /// many commits were dropped.
    pub fn clear(&mut self) -> usize {
        self.drags.clear();
        self.timers.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;

    fn columns() -> ColumnRegistry {
        ColumnRegistry::from_defs([
            ColumnDef::new("name").width(100.0).bounds(50.0, 400.0),
            ColumnDef::new("status").width(80.0),
        ])
    }

    #[test]
    fn test_moves_then_silence_commit_once() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        assert_eq!(resize.phase("name"), ResizePhase::Dragging);
        for (i, delta) in [10.0, 25.0, 40.0].into_iter().enumerate() {
            let now = start + Duration::from_millis(500 * i as u64);
            assert_eq!(resize.pointer_move("name", delta, now), Some(100.0 + delta));
            assert!(resize.poll(now, &mut columns).is_empty());
        }
        resize.release("name");
        assert_eq!(resize.phase("name"), ResizePhase::Committing);

        // Last move at 1000ms; nothing is due before 2500ms.
        assert!(resize.poll(start + Duration::from_millis(2499), &mut columns).is_empty());
        assert_eq!(columns.get("name").unwrap().width, 100.0);

        let committed = resize.poll(start + Duration::from_millis(2500), &mut columns);
        assert_eq!(committed, vec![("name".to_string(), 140.0)]);
        assert_eq!(columns.get("name").unwrap().width, 140.0);
        assert_eq!(resize.phase("name"), ResizePhase::Idle);
        assert!(resize.poll(start + Duration::from_secs(10), &mut columns).is_empty());
    }

    #[test]
    fn test_commit_is_clamped() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        resize.pointer_move("name", -90.0, start);
        resize.release("name");
        let committed = resize.poll(start + RESIZE_COMMIT_DELAY, &mut columns);
        assert_eq!(committed, vec![("name".to_string(), 50.0)]);
    }

    #[test]
    fn test_new_drag_cancels_pending_commit() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        resize.pointer_move("name", 20.0, start);
        resize.release("name");

        let restart = start + Duration::from_millis(1000);
        assert_eq!(resize.try_begin("name", &columns).unwrap(), 120.0);
        assert_eq!(resize.pending_commits(), 0);
        resize.pointer_move("name", 5.0, restart);
        resize.release("name");

        assert!(resize.poll(start + RESIZE_COMMIT_DELAY, &mut columns).is_empty());
        let committed = resize.poll(restart + RESIZE_COMMIT_DELAY, &mut columns);
        assert_eq!(committed, vec![("name".to_string(), 125.0)]);
    }

    #[test]
    fn test_commit_while_pointer_held() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        resize.pointer_move("name", 30.0, start);
        let committed = resize.poll(start + RESIZE_COMMIT_DELAY, &mut columns);
        assert_eq!(committed, vec![("name".to_string(), 130.0)]);
        assert_eq!(resize.phase("name"), ResizePhase::Dragging);

        // The drag continues from its original start.
        let later = start + Duration::from_secs(2);
        assert_eq!(resize.pointer_move("name", 50.0, later), Some(150.0));
        resize.release("name");
        let committed = resize.poll(later + RESIZE_COMMIT_DELAY, &mut columns);
        assert_eq!(committed, vec![("name".to_string(), 150.0)]);
    }

    #[test]
    fn test_columns_are_independent() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        resize.begin("status", &columns);
        resize.pointer_move("name", 10.0, start);
        resize.pointer_move("status", 10.0, start + Duration::from_millis(700));
        resize.release("name");
        resize.release("status");

        assert_eq!(
            resize.time_until_next_commit(start),
            Some(RESIZE_COMMIT_DELAY)
        );
        let first = resize.poll(start + RESIZE_COMMIT_DELAY, &mut columns);
        assert_eq!(first, vec![("name".to_string(), 110.0)]);
        assert_eq!(resize.pending_width("status"), Some(90.0));
    }

    #[test]
    fn test_release_without_move_returns_to_idle() {
        let columns = columns();
        let mut resize = ResizeController::new();
        resize.begin("name", &columns);
        resize.release("name");
        assert_eq!(resize.phase("name"), ResizePhase::Idle);
    }

    #[test]
    fn test_unknown_column_and_stray_moves_are_ignored() {
        let columns = columns();
        let mut resize = ResizeController::new();
        assert!(resize.try_begin("missing", &columns).is_err());
        resize.begin("missing", &columns);
        assert_eq!(resize.pointer_move("name", 10.0, Instant::now()), None);
        assert_eq!(resize.pending_commits(), 0);
    }

    #[test]
    fn test_cancel_and_clear_drop_without_commit() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        resize.pointer_move("name", 10.0, start);
        assert_eq!(resize.cancel("name"), Some(110.0));

        resize.begin("status", &columns);
        resize.pointer_move("status", 10.0, start);
        assert_eq!(resize.clear(), 1);

        assert!(resize.poll(start + Duration::from_secs(5), &mut columns).is_empty());
        assert_eq!(columns.get("name").unwrap().width, 100.0);
        assert_eq!(columns.get("status").unwrap().width, 80.0);
    }

    #[test]
    fn test_regrab_and_release_without_move_still_commits() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        resize.pointer_move("name", 50.0, start);
        resize.release("name");

        let regrab = start + Duration::from_millis(500);
        assert_eq!(resize.try_begin("name", &columns).unwrap(), 150.0);
        assert_eq!(resize.pending_commits(), 0);
        resize.release("name");
        assert_eq!(resize.phase("name"), ResizePhase::Committing);

        assert!(resize.poll(regrab, &mut columns).is_empty());
        let committed = resize.poll(start + Duration::from_millis(4500), &mut columns);
        assert_eq!(committed, vec![("name".to_string(), 150.0)]);
        assert_eq!(columns.get("name").unwrap().width, 150.0);
        assert_eq!(resize.phase("name"), ResizePhase::Idle);
    }

    #[test]
    fn test_release_after_held_commit_does_not_commit_again() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        resize.pointer_move("name", 30.0, start);
        assert_eq!(resize.poll(start + RESIZE_COMMIT_DELAY, &mut columns).len(), 1);
        resize.release("name");
        assert_eq!(resize.phase("name"), ResizePhase::Idle);
        assert_eq!(resize.pending_commits(), 0);
    }

    #[test]
    fn test_regrab_starts_from_displayed_width() {
        let mut columns = columns();
        let mut resize = ResizeController::new();
        let start = Instant::now();

        resize.begin("name", &columns);
        resize.pointer_move("name", -90.0, start);
        resize.release("name");

        // 10 is displayed clamped to the 50 minimum.
        assert_eq!(resize.try_begin("name", &columns).unwrap(), 50.0);
        let later = start + Duration::from_millis(300);
        assert_eq!(resize.pointer_move("name", 20.0, later), Some(70.0));
        resize.release("name");

        let committed = resize.poll(later + RESIZE_COMMIT_DELAY, &mut columns);
        assert_eq!(committed, vec![("name".to_string(), 70.0)]);
    }
}
