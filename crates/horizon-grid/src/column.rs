//! Column registry: column definitions, visibility, width, and display order.
//!
//! The registry is the authoritative store of column metadata for one table
//! session. Columns are kept in display order and each column's
//! `display_index` is its position, so the indices always form a permutation
//! of `0..len`.
//!
//! # Example
//!
//! ```
//! use horizon_grid::column::{ColumnDef, ColumnRegistry};
//! use horizon_grid::value::ColumnKind;
//!
//! let mut columns = ColumnRegistry::new();
//! columns.add_column(ColumnDef::new("name"));
//! columns.add_column(ColumnDef::new("status"));
//! columns.add_column(ColumnDef::new("estimate").kind(ColumnKind::Number).bounds(40.0, 200.0));
//!
//! columns.changed().connect(|change| {
//!     println!("columns changed: {:?}", change);
//! });
//!
//! let order = columns.reorder("estimate", "name");
//! assert_eq!(order, vec!["estimate", "name", "status"]);
//! assert_eq!(columns.commit_width("estimate", 500.0), Some(200.0));
//! ```

use horizon_grid_core::Signal;
use serde::Serialize;

use crate::error::{Result, TableError};
use crate::value::ColumnKind;

/// Width given to columns that do not declare one.
pub const DEFAULT_COLUMN_WIDTH: f32 = 100.0;
/// Default lower width bound.
pub const MINIMUM_COLUMN_WIDTH: f32 = 20.0;
/// Default upper width bound.
pub const MAXIMUM_COLUMN_WIDTH: f32 = 1000.0;

/// A column definition held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Unique ID; rows key their fields by it.
    pub id: String,
    /// Source property name the column was created from.
    pub key: String,
    /// Header text.
    pub label: String,
    /// Declared value type, used when sorting.
    pub kind: ColumnKind,
    /// Position in display order.
    pub display_index: usize,
    /// Committed width.
    pub width: f32,
    pub min_width: f32,
    pub max_width: f32,
    pub visible: bool,
    pub sortable: bool,
}

impl Column {
    /// Clamp `width` to this column's bounds. NaN keeps the current width.
    pub fn clamp_width(&self, width: f32) -> f32 {
        if width.is_nan() {
            self.width
        } else {
            width.clamp(self.min_width, self.max_width)
        }
    }
}

/// Builder for a new column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    id: String,
    key: Option<String>,
    label: Option<String>,
    kind: ColumnKind,
    width: f32,
    min_width: f32,
    max_width: f32,
    visible: bool,
    sortable: bool,
}

impl ColumnDef {
    /// Start a definition for a visible, sortable text column.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: None,
            label: None,
            kind: ColumnKind::Text,
            width: DEFAULT_COLUMN_WIDTH,
            min_width: MINIMUM_COLUMN_WIDTH,
            max_width: MAXIMUM_COLUMN_WIDTH,
            visible: true,
            sortable: true,
        }
    }

    /// The column's ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the source property key. Defaults to the ID.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the header label. Defaults to the ID.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the declared value type.
    pub fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the initial width.
    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Set the width bounds. Swapped bounds are put back in order.
    pub fn bounds(mut self, min_width: f32, max_width: f32) -> Self {
        self.min_width = min_width.min(max_width).max(1.0);
        self.max_width = max_width.max(min_width).max(self.min_width);
        self
    }

    /// Start the column hidden.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Ignore header clicks for sorting.
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    fn build(self, display_index: usize) -> Column {
        let mut column = Column {
            key: self.key.unwrap_or_else(|| self.id.clone()),
            label: self.label.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            kind: self.kind,
            display_index,
            width: self.width,
            min_width: self.min_width,
            max_width: self.max_width,
            visible: self.visible,
            sortable: self.sortable,
        };
        column.width = if self.width.is_nan() {
            DEFAULT_COLUMN_WIDTH.clamp(column.min_width, column.max_width)
        } else {
            column.clamp_width(self.width)
        };
        column
    }
}

/// A change notification emitted by [`ColumnRegistry::changed`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnChange {
    Added(String),
    Removed(String),
    /// The full display order after a reorder.
    Reordered(Vec<String>),
    VisibilityChanged { id: String, visible: bool },
    /// A final, debounced width write. Persistence collaborators listen here.
    WidthCommitted { id: String, width: f32 },
}

/// The authoritative store of column metadata for one table session.
#[derive(Debug, Default)]
pub struct ColumnRegistry {
    /// Columns in display order.
    columns: Vec<Column>,
    changed: Signal<ColumnChange>,
}

impl ColumnRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions in display order.
    ///
    /// Definitions that repeat an earlier ID are skipped.
    pub fn from_defs(defs: impl IntoIterator<Item = ColumnDef>) -> Self {
        let mut registry = Self::new();
        registry.changed.set_blocked(true);
        for def in defs {
            registry.add_column(def);
        }
        registry.changed.set_blocked(false);
        registry
    }

    /// The change notification signal.
    pub fn changed(&self) -> &Signal<ColumnChange> {
        &self.changed
    }

    /// Number of columns, hidden ones included.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All columns in display order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by ID.
    pub fn get(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Column IDs in display order.
    pub fn ordered_ids(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.id.clone()).collect()
    }

    /// Visible columns in display order.
    pub fn visible_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.visible).collect()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| TableError::unknown_column(id))
    }

    fn reindex(&mut self) {
        for (index, column) in self.columns.iter_mut().enumerate() {
            column.display_index = index;
        }
    }

    // =========================================================================
    // Add / Remove
    // =========================================================================

    /// Append a column at the end of display order.
    pub fn try_add_column(&mut self, def: ColumnDef) -> Result<usize> {
        if self.contains(def.id()) {
            return Err(TableError::DuplicateColumn(def.id().to_string()));
        }
        let display_index = self.columns.len();
        let column = def.build(display_index);
        let id = column.id.clone();
        self.columns.push(column);
        tracing::debug!(target: "horizon_grid::columns", %id, display_index, "column added");
        self.changed.emit(ColumnChange::Added(id));
        Ok(display_index)
    }

    /// Append a column; a duplicate ID is logged and ignored.
    pub fn add_column(&mut self, def: ColumnDef) -> bool {
        match self.try_add_column(def) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(target: "horizon_grid::columns", %err, "add_column ignored");
                false
            }
        }
    }

    /// Remove a column, re-packing the display indices.
    pub fn try_remove_column(&mut self, id: &str) -> Result<Column> {
        let index = self.position(id)?;
        let column = self.columns.remove(index);
        self.reindex();
        tracing::debug!(target: "horizon_grid::columns", %id, "column removed");
        self.changed.emit(ColumnChange::Removed(column.id.clone()));
        Ok(column)
    }

    /// Remove a column; an unknown ID is logged and ignored.
    pub fn remove_column(&mut self, id: &str) -> bool {
        match self.try_remove_column(id) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(target: "horizon_grid::columns", %err, "remove_column ignored");
                false
            }
        }
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Show or hide a column. Returns whether the visibility changed.
    pub fn try_set_visibility(&mut self, id: &str, visible: bool) -> Result<bool> {
        let index = self.position(id)?;
        let column = &mut self.columns[index];
        if column.visible == visible {
            return Ok(false);
        }
        column.visible = visible;
        tracing::debug!(target: "horizon_grid::columns", %id, visible, "column visibility changed");
        self.changed.emit(ColumnChange::VisibilityChanged {
            id: id.to_string(),
            visible,
        });
        Ok(true)
    }

    /// Show or hide a column; an unknown ID is logged and ignored.
    pub fn set_visibility(&mut self, id: &str, visible: bool) {
        if let Err(err) = self.try_set_visibility(id, visible) {
            tracing::warn!(target: "horizon_grid::columns", %err, "set_visibility ignored");
        }
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    /// Move `dragged` so it sits immediately before `target`.
    ///
    /// Returns the full display order after the move.
    pub fn try_reorder(&mut self, dragged: &str, target: &str) -> Result<Vec<String>> {
        let from = self.position(dragged)?;
        self.position(target)?;
        if dragged == target {
            return Ok(self.ordered_ids());
        }

        let column = self.columns.remove(from);
        let to = self
            .columns
            .iter()
            .position(|c| c.id == target)
            .unwrap_or(self.columns.len());
        self.columns.insert(to, column);

        let order = self.ordered_ids();
        if from != to {
            self.reindex();
            tracing::debug!(target: "horizon_grid::columns", %dragged, %target, ?order, "columns reordered");
            self.changed.emit(ColumnChange::Reordered(order.clone()));
        }
        Ok(order)
    }

    /// Move `dragged` before `target`; unknown IDs leave the order unchanged.
    pub fn reorder(&mut self, dragged: &str, target: &str) -> Vec<String> {
        match self.try_reorder(dragged, target) {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(target: "horizon_grid::columns", %err, "reorder ignored");
                self.ordered_ids()
            }
        }
    }

    // =========================================================================
    // Width
    // =========================================================================

    /// Clamp and store a column's final width. Returns the stored width.
    pub fn try_commit_width(&mut self, id: &str, width: f32) -> Result<f32> {
        let index = self.position(id)?;
        let column = &mut self.columns[index];
        let clamped = column.clamp_width(width);
        column.width = clamped;
        tracing::debug!(target: "horizon_grid::columns", %id, proposed = width, committed = clamped, "column width committed");
        self.changed.emit(ColumnChange::WidthCommitted {
            id: id.to_string(),
            width: clamped,
        });
        Ok(clamped)
    }

    /// Commit a column's width; an unknown ID is logged and ignored.
    pub fn commit_width(&mut self, id: &str, width: f32) -> Option<f32> {
        match self.try_commit_width(id, width) {
            Ok(width) => Some(width),
            Err(err) => {
                tracing::warn!(target: "horizon_grid::columns", %err, "commit_width ignored");
                None
            }
        }
    }
}
