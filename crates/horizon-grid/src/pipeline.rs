//! Derivation pipeline: filter, sort, and paginate rows into a view.
//!
//! [`derive`] is a pure function of its inputs. It never mutates the rows or
//! the registry; the result is a list of indices into the row slice, in
//! display order, plus the counts a rendering layer shows.
//!
//! The passes always run in the same order:
//!
//! 1. **Filter**: a row survives when any visible column's stringified value
//!    contains the filter text, ignoring case. Empty text keeps every row.
//! 2. **Sort**: a stable multi-key sort. Each key compares values using the
//!    column's [`ColumnKind`]. Unset values sort last in either direction.
//! 3. **Paginate**: an optional slice. A page index past the end clamps to
//!    the last page.

use std::cmp::Ordering;

use horizon_grid_core::PerfSpan;
use serde::{Deserialize, Serialize};

use crate::column::ColumnRegistry;
use crate::row::Row;
use crate::value::{ColumnKind, SortValue};

/// Sort direction for one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// One entry of a [`SortSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Descending)
    }
}

/// Ordered sort keys. The first key has the highest priority; no keys
/// keeps natural order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = SortKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// The direction a column is sorted in, if it has a key.
    pub fn direction_of(&self, column: &str) -> Option<SortDirection> {
        self.keys
            .iter()
            .find(|k| k.column == column)
            .map(|k| k.direction)
    }

    /// Zero-based priority of a column's key.
    pub fn priority_of(&self, column: &str) -> Option<usize> {
        self.keys.iter().position(|k| k.column == column)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Replace the column's key in place, or append it.
    pub(crate) fn upsert(&mut self, column: &str, direction: SortDirection) {
        match self.keys.iter_mut().find(|k| k.column == column) {
            Some(key) => key.direction = direction,
            None => self.keys.push(SortKey::new(column, direction)),
        }
    }

    pub(crate) fn remove(&mut self, column: &str) {
        self.keys.retain(|k| k.column != column);
    }

    /// Drop keys for columns the registry no longer has. Returns how many
    /// were dropped.
    pub(crate) fn prune(&mut self, columns: &ColumnRegistry) -> usize {
        let before = self.keys.len();
        self.keys.retain(|k| columns.contains(&k.column));
        before - self.keys.len()
    }
}

/// Page size and requested page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Rows per page. `None` or zero disables pagination.
    pub page_size: Option<usize>,
    pub page_index: usize,
}

impl Pagination {
    pub fn new(page_size: Option<usize>, page_index: usize) -> Self {
        Self {
            page_size,
            page_index,
        }
    }

    fn effective_size(&self) -> Option<usize> {
        self.page_size.filter(|&size| size > 0)
    }

    /// Number of pages for `rows` rows. Never zero.
    pub fn page_count(&self, rows: usize) -> usize {
        match self.effective_size() {
            Some(size) => rows.div_ceil(size).max(1),
            None => 1,
        }
    }

    /// The requested page index clamped to the valid range.
    pub fn clamped_index(&self, rows: usize) -> usize {
        self.page_index.min(self.page_count(rows) - 1)
    }
}

/// The page a derived view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Clamped page index.
    pub index: usize,
    /// Rows per page, if paginated.
    pub size: Option<usize>,
    /// Total number of pages.
    pub count: usize,
}

impl PageInfo {
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.count
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }
}

/// The output of one derivation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedView {
    /// Indices into the row slice, in display order, for the current page.
    pub row_indices: Vec<usize>,
    /// Rows before filtering.
    pub total_rows: usize,
    /// Rows surviving the filter, across all pages.
    pub filtered_rows: usize,
    pub page: PageInfo,
}

impl DerivedView {
    /// Resolve the indices against the rows the view was derived from.
    pub fn rows<'s, 'r>(&'s self, all: &'r [Row]) -> impl Iterator<Item = &'r Row> + use<'s, 'r> {
        self.row_indices.iter().filter_map(move |&i| all.get(i))
    }

    pub fn len(&self) -> usize {
        self.row_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_indices.is_empty()
    }
}

/// Whether a row matches the filter in any visible column.
///
/// `needle` must already be lowercased.
fn row_matches(row: &Row, visible: &[&str], needle: &str) -> bool {
    visible.iter().any(|column| {
        row.get(column)
            .is_some_and(|value| value.to_string().to_lowercase().contains(needle))
    })
}

/// Compare two rows' precomputed sort values key by key.
fn compare_rows(a: &[Option<SortValue>], b: &[Option<SortValue>], directions: &[SortDirection]) -> Ordering {
    for ((a, b), direction) in a.iter().zip(b).zip(directions) {
        let ordering = match (a, b) {
            (Some(a), Some(b)) => direction.apply(a.compare(b)),
            // Unset values go last regardless of direction.
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Run the filter, sort, and pagination passes.
pub fn derive(
    rows: &[Row],
    columns: &ColumnRegistry,
    sort: &SortSpec,
    filter: &str,
    pagination: Pagination,
) -> DerivedView {
    let _span = PerfSpan::new("derive");

    let visible: Vec<&str> = columns
        .visible_columns()
        .into_iter()
        .map(|c| c.id.as_str())
        .collect();

    let mut indices: Vec<usize> = if filter.is_empty() {
        (0..rows.len()).collect()
    } else {
        let needle = filter.to_lowercase();
        (0..rows.len())
            .filter(|&i| row_matches(&rows[i], &visible, &needle))
            .collect()
    };

    // Keys for unknown columns are ignored.
    let keys: Vec<(&str, ColumnKind, SortDirection)> = sort
        .keys()
        .iter()
        .filter_map(|key| {
            columns
                .get(&key.column)
                .map(|c| (c.id.as_str(), c.kind, key.direction))
        })
        .collect();

    if !keys.is_empty() {
        let directions: Vec<SortDirection> = keys.iter().map(|(_, _, d)| *d).collect();
        let mut decorated: Vec<(usize, Vec<Option<SortValue>>)> = indices
            .iter()
            .map(|&i| {
                let values = keys
                    .iter()
                    .map(|(column, kind, _)| kind.sort_value(rows[i].get(column)))
                    .collect();
                (i, values)
            })
            .collect();
        decorated.sort_by(|(_, a), (_, b)| compare_rows(a, b, &directions));
        indices = decorated.into_iter().map(|(i, _)| i).collect();
    }

    let filtered_rows = indices.len();
    let page = PageInfo {
        index: pagination.clamped_index(filtered_rows),
        size: pagination.effective_size(),
        count: pagination.page_count(filtered_rows),
    };
    if let Some(size) = page.size {
        let start = (page.index * size).min(filtered_rows);
        let end = (start + size).min(filtered_rows);
        indices = indices[start..end].to_vec();
    }

    tracing::trace!(
        target: "horizon_grid::pipeline",
        total = rows.len(),
        filtered = filtered_rows,
        shown = indices.len(),
        sort_keys = keys.len(),
        page = page.index,
        "view derived"
    );

    DerivedView {
        row_indices: indices,
        total_rows: rows.len(),
        filtered_rows,
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;

    fn columns() -> ColumnRegistry {
        ColumnRegistry::from_defs([
            ColumnDef::new("name"),
            ColumnDef::new("estimate").kind(ColumnKind::Number),
            ColumnDef::new("notes").hidden(),
        ])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new("a").with("name", "Write docs").with("estimate", 3),
            Row::new("b").with("name", "fix bug").with("estimate", "10").with("notes", "urgent"),
            Row::new("c").with("name", "Review"),
            Row::new("d").with("name", "deploy").with("estimate", 9),
        ]
    }

    fn ids(view: &DerivedView, rows: &[Row]) -> Vec<String> {
        view.rows(rows).map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let rows = rows();
        let view = derive(&rows, &columns(), &SortSpec::new(), "", Pagination::default());
        assert_eq!(view.row_indices, vec![0, 1, 2, 3]);
        assert_eq!(view.total_rows, 4);
        assert_eq!(view.filtered_rows, 4);
    }

    #[test]
    fn test_filter_is_case_insensitive_over_visible_columns() {
        let rows = rows();
        let view = derive(&rows, &columns(), &SortSpec::new(), "DE", Pagination::default());
        assert_eq!(ids(&view, &rows), vec!["d"]);

        // "urgent" only appears in a hidden column.
        let view = derive(&rows, &columns(), &SortSpec::new(), "urgent", Pagination::default());
        assert!(view.is_empty());
        assert_eq!(view.total_rows, 4);
    }

    #[test]
    fn test_filter_matches_stringified_numbers() {
        let rows = rows();
        let view = derive(&rows, &columns(), &SortSpec::new(), "10", Pagination::default());
        assert_eq!(ids(&view, &rows), vec!["b"]);
    }

    #[test]
    fn test_numeric_sort_puts_unset_last() {
        let rows = rows();
        let columns = columns();

        let asc = SortSpec::from_keys([SortKey::ascending("estimate")]);
        let view = derive(&rows, &columns, &asc, "", Pagination::default());
        assert_eq!(ids(&view, &rows), vec!["a", "d", "b", "c"]);

        let desc = SortSpec::from_keys([SortKey::descending("estimate")]);
        let view = derive(&rows, &columns, &desc, "", Pagination::default());
        assert_eq!(ids(&view, &rows), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_text_sort_normalizes_case() {
        let rows = rows();
        let spec = SortSpec::from_keys([SortKey::ascending("name")]);
        let view = derive(&rows, &columns(), &spec, "", Pagination::default());
        assert_eq!(ids(&view, &rows), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_multi_key_sort_is_stable() {
        let rows = vec![
            Row::new("1").with("name", "x").with("estimate", 2),
            Row::new("2").with("name", "y").with("estimate", 1),
            Row::new("3").with("name", "x").with("estimate", 1),
            Row::new("4").with("name", "y").with("estimate", 1),
        ];
        let spec = SortSpec::from_keys([SortKey::ascending("estimate")]);
        let view = derive(&rows, &columns(), &spec, "", Pagination::default());
        assert_eq!(ids(&view, &rows), vec!["2", "3", "4", "1"]);

        let spec = SortSpec::from_keys([SortKey::descending("name"), SortKey::ascending("estimate")]);
        let view = derive(&rows, &columns(), &spec, "", Pagination::default());
        assert_eq!(ids(&view, &rows), vec!["2", "4", "3", "1"]);
    }

    #[test]
    fn test_unknown_sort_key_is_ignored() {
        let rows = rows();
        let spec = SortSpec::from_keys([SortKey::descending("missing")]);
        let view = derive(&rows, &columns(), &spec, "", Pagination::default());
        assert_eq!(view.row_indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_pagination_slices_and_clamps() {
        let rows: Vec<Row> = (0..25).map(|i| Row::new(format!("r{i}")).with("name", i)).collect();
        let columns = columns();

        let view = derive(&rows, &columns, &SortSpec::new(), "", Pagination::new(Some(10), 2));
        assert_eq!(view.row_indices, (20..25).collect::<Vec<_>>());
        assert_eq!(view.page, PageInfo { index: 2, size: Some(10), count: 3 });
        assert!(!view.page.has_next());

        let view = derive(&rows[..5], &columns, &SortSpec::new(), "", Pagination::new(Some(10), 2));
        assert_eq!(view.page.index, 0);
        assert_eq!(view.row_indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_pagination_with_no_rows() {
        let view = derive(&[], &columns(), &SortSpec::new(), "", Pagination::new(Some(10), 4));
        assert_eq!(view.page, PageInfo { index: 0, size: Some(10), count: 1 });
        assert!(view.is_empty());
    }

    #[test]
    fn test_zero_page_size_disables_pagination() {
        let rows = rows();
        let view = derive(&rows, &columns(), &SortSpec::new(), "", Pagination::new(Some(0), 3));
        assert_eq!(view.len(), 4);
        assert_eq!(view.page, PageInfo { index: 0, size: None, count: 1 });
    }

    #[test]
    fn test_spec_queries() {
        let mut spec = SortSpec::from_keys([SortKey::ascending("a"), SortKey::descending("b")]);
        assert_eq!(spec.direction_of("b"), Some(SortDirection::Descending));
        assert_eq!(spec.priority_of("b"), Some(1));
        assert_eq!(spec.priority_of("c"), None);

        spec.upsert("a", SortDirection::Descending);
        assert_eq!(spec.priority_of("a"), Some(0));
        spec.remove("a");
        assert_eq!(spec.keys(), &[SortKey::descending("b")]);
    }
}
