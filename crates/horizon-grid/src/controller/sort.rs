//! Header-click sorting.

use crate::column::ColumnRegistry;
use crate::error::{Result, TableError};
use crate::pipeline::{SortDirection, SortSpec};

/// The direction after one more click on a header: none, ascending,
/// descending, then none again.
pub fn next_direction(current: Option<SortDirection>) -> Option<SortDirection> {
    match current {
        None => Some(SortDirection::Ascending),
        Some(SortDirection::Ascending) => Some(SortDirection::Descending),
        Some(SortDirection::Descending) => None,
    }
}

/// Apply a header click on `column` to `spec`.
///
/// Without `multi` the clicked column becomes the only sort key, and a
/// column that was not already the only key starts at ascending. With
/// `multi` its key is updated in place, appended, or removed, and the other
/// keys are kept. Returns the column's new direction.
pub fn try_toggle(
    spec: &mut SortSpec,
    columns: &ColumnRegistry,
    column: &str,
    multi: bool,
) -> Result<Option<SortDirection>> {
    let definition = columns
        .get(column)
        .ok_or_else(|| TableError::unknown_column(column))?;
    if !definition.sortable {
        return Err(TableError::NotSortable(column.to_string()));
    }

    // A single click restarts the cycle unless the column is already the
    // only key.
    let current = if multi || spec.len() == 1 {
        spec.direction_of(column)
    } else {
        None
    };
    let next = next_direction(current);
    if !multi {
        spec.clear();
    }
    match next {
        Some(direction) => spec.upsert(column, direction),
        None => spec.remove(column),
    }
    tracing::debug!(target: "horizon_grid::controller", %column, multi, direction = ?next, "sort toggled");
    Ok(next)
}

/// Apply a header click; unknown and unsortable columns are ignored.
pub fn toggle(
    spec: &mut SortSpec,
    columns: &ColumnRegistry,
    column: &str,
    multi: bool,
) -> Option<SortDirection> {
    match try_toggle(spec, columns, column, multi) {
        Ok(direction) => direction,
        Err(err) => {
            tracing::warn!(target: "horizon_grid::controller", %err, "sort toggle ignored");
            spec.direction_of(column)
        }
    }
}
