//! Change-detecting value cells.
//!
//! A [`Property`] reports whether a write changed its value. Stores pair one
//! with a [`Signal`](crate::Signal) and emit only when a write reports a
//! change, so listeners never see no-op notifications.
//!
//! ```
//! use horizon_grid_core::{Property, Signal};
//!
//! let page_size = Property::new(Some(25usize));
//! let page_size_changed = Signal::<Option<usize>>::new();
//!
//! for requested in [Some(25), None, None] {
//!     if page_size.set(requested) {
//!         page_size_changed.emit(requested);
//!     }
//! }
//! assert_eq!(page_size.get(), None);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value cell that reports whether writes change it.
///
/// Writes go through `&self`; the owning store keeps them behind its own
/// action methods.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Read the value in place.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Store `value`. Returns whether it differed from the old one.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        let changed = *current != value;
        if changed {
            *current = value;
        }
        changed
    }

    /// Edit a copy of the value and store it if it differs.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut current = self.value.write();
        let mut next = current.clone();
        f(&mut next);
        let changed = *current != next;
        if changed {
            *current = next;
        }
        changed
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}
