//! Interaction controllers.
//!
//! Each controller turns one kind of user gesture into mutations on the
//! column registry, row store, or view state. Controllers share no state
//! with each other.
//!
//! - [`ResizeController`]: resize drags with a debounced width commit
//! - [`ReorderDrag`]: header drag-and-drop, reordering on drop
//! - [`sort`]: header clicks cycling sort direction
//! - [`NewRowInput`]: the text input that names new rows

mod input;
mod resize;
pub mod sort;

pub use input::{InputKey, NewRowInput};
pub use resize::{RESIZE_COMMIT_DELAY, ResizeController, ResizePhase};

use crate::column::ColumnRegistry;

/// A header drag in progress. The reorder happens in one step on drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderDrag {
    dragged: Option<String>,
}

impl ReorderDrag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up a column header.
    pub fn start(&mut self, column: impl Into<String>) {
        self.dragged = Some(column.into());
    }

    /// The column being dragged.
    pub fn dragged(&self) -> Option<&str> {
        self.dragged.as_deref()
    }

    pub fn cancel(&mut self) {
        self.dragged = None;
    }

    /// Drop the dragged header onto `target`.
    ///
    /// Returns the new display order, or `None` when nothing was dragged.
    pub fn drop_on(&mut self, target: &str, columns: &mut ColumnRegistry) -> Option<Vec<String>> {
        let dragged = self.dragged.take()?;
        Some(columns.reorder(&dragged, target))
    }
}
