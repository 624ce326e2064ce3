//! Prelude module for Horizon Grid.
//!
//! ```ignore
//! use horizon_grid::prelude::*;
//! ```

// ============================================================================
// Session
// ============================================================================

pub use crate::session::{ColumnState, RenderSnapshot, TableSession, ViewChange};

// ============================================================================
// Stores
// ============================================================================

pub use crate::column::{Column, ColumnChange, ColumnDef, ColumnRegistry};
pub use crate::config::{CellSize, ConfigOverrides, ConfigStore, TableConfig};
pub use crate::row::{Row, RowChange, RowStore};
pub use crate::template::{RowTemplate, TemplateOption, TemplateRegistry};
pub use crate::value::{CellValue, ColumnKind};

// ============================================================================
// Derivation and interaction
// ============================================================================

pub use crate::controller::{InputKey, NewRowInput, RESIZE_COMMIT_DELAY, ResizePhase};
pub use crate::pipeline::{PageInfo, Pagination, SortDirection, SortKey, SortSpec};

// ============================================================================
// Signals and errors
// ============================================================================

pub use crate::{Result, TableError};
pub use horizon_grid_core::{ConnectionId, Signal};
