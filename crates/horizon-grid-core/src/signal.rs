//! Change notification for stores.
//!
//! Every store in the engine owns one [`Signal`] per kind of change and
//! emits on it after mutating. Rendering and persistence collaborators
//! subscribe with [`Signal::connect`] instead of holding references into the
//! store.
//!
//! Slots run synchronously on the emitting thread. The slot list is copied
//! before any slot runs, so a slot may connect to or disconnect from the
//! signal that is calling it; such changes take effect on the next emit.
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let width_committed = Signal::<(String, f32)>::new();
//! let id = width_committed.connect(|(column, width)| {
//!     println!("persist {column} = {width}");
//! });
//!
//! width_committed.emit(("name".into(), 140.0));
//! assert!(width_committed.disconnect(id));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::error::SignalError;

new_key_type! {
    /// Handle for one connected slot.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A list of slots called with `&Args` on every emit.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
    /// Emits are dropped while set, e.g. during bulk loads.
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a signal with no slots.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Add a slot.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Add a slot that stays connected while the returned guard lives.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<'_, Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard { signal: self, id }
    }

    /// Remove a slot. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Remove a slot; an unknown ID is an error.
    pub fn try_disconnect(&self, id: ConnectionId) -> Result<(), SignalError> {
        if self.disconnect(id) {
            Ok(())
        } else {
            Err(SignalError::InvalidConnection)
        }
    }

    /// Remove every slot.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Drop emits until unblocked.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Call every slot with `args`.
    #[tracing::instrument(skip_all, target = "horizon_grid_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "horizon_grid_core::signal", "signal blocked, skipping emit");
            return;
        }

        // Lock released before slots run.
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: "horizon_grid_core::signal", connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

/// Disconnects its slot when dropped. Borrows the signal, so it cannot
/// outlive it.
///
/// ```
/// use horizon_grid_core::Signal;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let rows_changed = Signal::<usize>::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// {
///     let seen = seen.clone();
///     let _guard = rows_changed.connect_scoped(move |&count| {
///         seen.store(count, Ordering::SeqCst);
///     });
///     rows_changed.emit(3);
/// }
/// rows_changed.emit(5);
/// assert_eq!(seen.load(Ordering::SeqCst), 3);
/// ```
pub struct ConnectionGuard<'a, Args: 'static> {
    signal: &'a Signal<Args>,
    id: ConnectionId,
}

impl<Args: 'static> ConnectionGuard<'_, Args> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: 'static> Drop for ConnectionGuard<'_, Args> {
    fn drop(&mut self) {
        self.signal.disconnect(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone, PartialEq)]
    enum Change {
        Added(String),
        Removed(String),
    }

    fn recorder(signal: &Signal<Change>) -> (ConnectionId, Arc<Mutex<Vec<Change>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let id = signal.connect(move |change: &Change| sink.lock().push(change.clone()));
        (id, log)
    }

    #[test]
    fn test_emit_reaches_every_slot() {
        let changed = Signal::new();
        let (_, first) = recorder(&changed);
        let (_, second) = recorder(&changed);
        assert_eq!(changed.connection_count(), 2);

        changed.emit(Change::Added("a".into()));
        assert_eq!(*first.lock(), vec![Change::Added("a".into())]);
        assert_eq!(*second.lock(), *first.lock());
    }

    #[test]
    fn test_disconnect() {
        let changed = Signal::new();
        let (id, log) = recorder(&changed);

        changed.emit(Change::Added("a".into()));
        assert!(changed.disconnect(id));
        changed.emit(Change::Removed("a".into()));

        assert_eq!(log.lock().len(), 1);
        assert!(!changed.disconnect(id));
        assert_eq!(changed.try_disconnect(id), Err(SignalError::InvalidConnection));
    }

    #[test]
    fn test_blocked_signal_drops_emits() {
        let changed = Signal::new();
        let (_, log) = recorder(&changed);

        changed.set_blocked(true);
        changed.emit(Change::Added("loaded".into()));
        changed.set_blocked(false);
        changed.emit(Change::Added("typed".into()));

        assert!(!changed.is_blocked());
        assert_eq!(*log.lock(), vec![Change::Added("typed".into())]);
    }

    #[test]
    fn test_scoped_connection() {
        let changed = Signal::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let sink = log.clone();
            let _guard = changed.connect_scoped(move |c: &Change| sink.lock().push(c.clone()));
            assert_eq!(changed.connection_count(), 1);
            changed.emit(Change::Removed("x".into()));
        }
        assert_eq!(changed.connection_count(), 0);
        changed.emit(Change::Removed("y".into()));
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_slot_may_disconnect_itself() {
        let signal = Arc::new(Signal::<()>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None));

        let signal_clone = signal.clone();
        let calls_clone = calls.clone();
        let own_id_clone = own_id.clone();
        let id = signal.connect(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *own_id_clone.lock() {
                signal_clone.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.emit(());
        signal.emit(());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        signal.disconnect_all();
    }
}
