//! Table session: one open table view.
//!
//! A [`TableSession`] exclusively owns the column registry, row store, view
//! state (sort, filter, page), and interaction state of one view. A
//! rendering layer drives it in two directions:
//!
//! - gestures go in through the action methods, which never fail: invalid
//!   references and blank input are logged and ignored;
//! - [`TableSession::render`] hands back a [`RenderSnapshot`] with everything
//!   needed to draw the table.
//!
//! Every render starts by repairing derived state that may have drifted:
//! the cached column order is resynchronized with the registry, sort keys
//! for removed columns are pruned, and the page index is clamped.
//!
//! ```
//! use horizon_grid::prelude::*;
//!
//! let mut session = TableSession::new(
//!     [ColumnDef::new("name"), ColumnDef::new("status")],
//!     [Row::new("a").with("name", "Write docs").with("status", "todo")],
//!     ConfigStore::default(),
//!     TemplateRegistry::new(),
//! );
//!
//! session.set_filter("docs");
//! let snapshot = session.render();
//! assert_eq!(snapshot.filtered_rows, 1);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use horizon_grid_core::{PerfSpan, Signal};
use serde::Serialize;

use crate::column::{Column, ColumnDef, ColumnRegistry};
use crate::config::{CellSize, ConfigStore, TableConfig};
use crate::controller::{self, InputKey, NewRowInput, ReorderDrag, ResizeController, ResizePhase};
use crate::error::{Result, TableError};
use crate::pipeline::{self, PageInfo, Pagination, SortDirection, SortSpec};
use crate::row::{Row, RowStore};
use crate::template::{RowTemplate, TemplateOption, TemplateRegistry};
use crate::value::{CellValue, ColumnKind};

/// A change to the view state, emitted by [`TableSession::view_changed`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewChange {
    Sort(SortSpec),
    Filter(String),
    Page(usize),
}

/// Render state of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnState<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub kind: ColumnKind,
    /// Width to draw: the pending width while resizing, else the committed one.
    pub width: f32,
    pub resize: ResizePhase,
    pub visible: bool,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
    /// Zero-based sort priority, for multi-sort indicators.
    pub sort_priority: Option<usize>,
}

/// Everything a rendering layer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot<'a> {
    /// All columns in display order, hidden ones included.
    pub columns: Vec<ColumnState<'a>>,
    /// Rows of the current page, in display order.
    pub rows: Vec<&'a Row>,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub page: PageInfo,
    pub filter: &'a str,
    pub cell_size: CellSize,
    pub sticky_first_column: bool,
    pub template_options: Vec<TemplateOption>,
    pub selected_template: Option<String>,
    pub new_row_text: &'a str,
}

impl<'a> RenderSnapshot<'a> {
    /// Visible columns in display order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnState<'a>> {
        self.columns.iter().filter(|c| c.visible)
    }

    /// IDs of the rows shown, in display order.
    pub fn row_ids(&self) -> Vec<&'a str> {
        self.rows.iter().map(|r| r.id()).collect()
    }

    /// Stringified cell text. Missing values render as empty.
    pub fn cell_text(row: &Row, column: &str) -> String {
        row.get(column).map(ToString::to_string).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct StateDump<'a> {
    columns: &'a [Column],
    column_order: &'a [String],
    rows: &'a [Row],
    sort: &'a SortSpec,
    filter: &'a str,
    page_index: usize,
    sizing: BTreeMap<&'a str, f32>,
    config: TableConfig,
    new_row: &'a NewRowInput,
}

/// One open table view.
#[derive(Debug)]
pub struct TableSession {
    columns: ColumnRegistry,
    rows: RowStore,
    templates: TemplateRegistry,
    config: ConfigStore,
    sort: SortSpec,
    filter: String,
    page_index: usize,
    last_page: Option<PageInfo>,
    /// Display order as last handed to the rendering layer.
    column_order: Vec<String>,
    resize: ResizeController,
    reorder: ReorderDrag,
    new_row: NewRowInput,
    view_changed: Signal<ViewChange>,
}

impl TableSession {
    /// Open a session over the given columns and rows.
    ///
    /// Duplicate column or row IDs are skipped, and row fields for unknown
    /// columns are stripped.
    pub fn new(
        columns: impl IntoIterator<Item = ColumnDef>,
        rows: impl IntoIterator<Item = Row>,
        config: ConfigStore,
        templates: TemplateRegistry,
    ) -> Self {
        Self::with_row_store(columns, rows, RowStore::default(), config, templates)
    }

    /// Open a session whose new rows write their name to `identity_field`.
    pub fn with_identity_field(
        columns: impl IntoIterator<Item = ColumnDef>,
        rows: impl IntoIterator<Item = Row>,
        identity_field: &str,
        config: ConfigStore,
        templates: TemplateRegistry,
    ) -> Self {
        Self::with_row_store(columns, rows, RowStore::new(identity_field), config, templates)
    }

    fn with_row_store(
        columns: impl IntoIterator<Item = ColumnDef>,
        rows: impl IntoIterator<Item = Row>,
        mut store: RowStore,
        config: ConfigStore,
        templates: TemplateRegistry,
    ) -> Self {
        let columns = ColumnRegistry::from_defs(columns);
        store.load(rows, &columns);
        let column_order = columns.ordered_ids();
        tracing::debug!(
            target: "horizon_grid::session",
            columns = columns.len(),
            rows = store.len(),
            templates = templates.len(),
            "session opened"
        );
        Self {
            columns,
            rows: store,
            templates,
            config,
            sort: SortSpec::new(),
            filter: String::new(),
            page_index: 0,
            last_page: None,
            column_order,
            resize: ResizeController::new(),
            reorder: ReorderDrag::new(),
            new_row: NewRowInput::new(),
            view_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// The requested page index. Clamped on the next render.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn new_row_input(&self) -> &NewRowInput {
        &self.new_row
    }

    pub fn resize(&self) -> &ResizeController {
        &self.resize
    }

    /// Emitted when the sort, filter, or page changes.
    pub fn view_changed(&self) -> &Signal<ViewChange> {
        &self.view_changed
    }

    // =========================================================================
    // Columns
    // =========================================================================

    pub fn set_column_visibility(&mut self, column: &str, visible: bool) {
        self.columns.set_visibility(column, visible);
    }

    pub fn add_column(&mut self, def: ColumnDef) -> bool {
        self.columns.add_column(def)
    }

    /// Remove a column and the row fields keyed by it.
    pub fn remove_column(&mut self, column: &str) -> bool {
        if !self.columns.remove_column(column) {
            return false;
        }
        self.rows.retain_known(&self.columns);
        self.resize.cancel(column);
        true
    }

    /// Move `dragged` before `target`. Returns the new display order.
    pub fn reorder_columns(&mut self, dragged: &str, target: &str) -> Vec<String> {
        self.reconcile_column_order();
        self.column_order = self.columns.reorder(dragged, target);
        self.column_order.clone()
    }

    /// Pick up a column header for drag-and-drop.
    pub fn begin_column_drag(&mut self, column: &str) {
        if self.columns.contains(column) {
            self.reorder.start(column);
        } else {
            tracing::warn!(target: "horizon_grid::session", %column, "drag of unknown column ignored");
        }
    }

    /// Drop the dragged header onto `target`.
    pub fn drop_column(&mut self, target: &str) -> Option<Vec<String>> {
        self.reconcile_column_order();
        let order = self.reorder.drop_on(target, &mut self.columns)?;
        self.column_order = order.clone();
        Some(order)
    }

    pub fn cancel_column_drag(&mut self) {
        self.reorder.cancel();
    }

    // =========================================================================
    // Resize
    // =========================================================================

    pub fn begin_resize(&mut self, column: &str) {
        self.resize.begin(column, &self.columns);
    }

    /// Apply a resize pointer move. Returns the pending width.
    pub fn resize_move(&mut self, column: &str, cumulative_delta: f32, now: Instant) -> Option<f32> {
        self.resize.pointer_move(column, cumulative_delta, now)
    }

    pub fn release_resize(&mut self, column: &str) {
        self.resize.release(column);
    }

    /// Fire due width commits. Returns the committed `(column, width)` pairs.
    pub fn tick(&mut self, now: Instant) -> Vec<(String, f32)> {
        self.resize.poll(now, &mut self.columns)
    }

    /// How long the host may sleep before the next [`tick`](Self::tick) is due.
    pub fn time_until_next_tick(&mut self, now: Instant) -> Option<Duration> {
        self.resize.time_until_next_commit(now)
    }

    // =========================================================================
    // Sort, filter, pagination
    // =========================================================================

    /// Handle a click on a column header.
    pub fn toggle_sort(&mut self, column: &str, multi: bool) -> Option<SortDirection> {
        let before = self.sort.clone();
        let direction = controller::sort::toggle(&mut self.sort, &self.columns, column, multi);
        if self.sort != before {
            self.view_changed.emit(ViewChange::Sort(self.sort.clone()));
        }
        direction
    }

    pub fn clear_sort(&mut self) {
        if !self.sort.is_empty() {
            self.sort.clear();
            self.view_changed.emit(ViewChange::Sort(SortSpec::new()));
        }
    }

    /// Update the filter text. Applied on the next render, without debounce.
    pub fn set_filter(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.filter {
            self.filter = text;
            tracing::trace!(target: "horizon_grid::session", filter = %self.filter, "filter changed");
            self.view_changed.emit(ViewChange::Filter(self.filter.clone()));
        }
    }

    /// Request a page. Out-of-range indices clamp on the next render.
    pub fn set_page(&mut self, index: usize) {
        if index != self.page_index {
            self.page_index = index;
            self.view_changed.emit(ViewChange::Page(index));
        }
    }

    /// Step forward if the last render showed a next page.
    pub fn next_page(&mut self) {
        let has_next = self.last_page.is_none_or(|page| page.has_next());
        if has_next {
            self.set_page(self.page_index.saturating_add(1));
        }
    }

    /// Step back from the requested page. Clamps on the next render.
    pub fn prev_page(&mut self) {
        self.set_page(self.page_index.saturating_sub(1));
    }

    // =========================================================================
    // Rows
    // =========================================================================

    pub fn remove_row(&mut self, id: &str) -> Option<Row> {
        self.rows.remove_row(id)
    }

    /// Write a cell value on behalf of a cell-edit collaborator.
    pub fn try_set_cell(&mut self, row: &str, column: &str, value: impl Into<CellValue>) -> Result<()> {
        if !self.columns.contains(column) {
            return Err(TableError::unknown_column(column));
        }
        let record = self
            .rows
            .row_mut(row)
            .ok_or_else(|| TableError::unknown_row(row))?;
        record.set(column, value);
        Ok(())
    }

    /// Write a cell value; unknown rows and columns are logged and ignored.
    pub fn set_cell(&mut self, row: &str, column: &str, value: impl Into<CellValue>) {
        if let Err(err) = self.try_set_cell(row, column, value) {
            tracing::warn!(target: "horizon_grid::session", %err, "set_cell ignored");
        }
    }

    pub fn set_new_row_input(&mut self, text: impl Into<String>) {
        self.new_row.set_text(text);
    }

    pub fn focus_new_row_input(&mut self, focused: bool) {
        if focused {
            self.new_row.focus();
        } else {
            self.new_row.blur();
        }
    }

    /// Deliver a key to the new-row input. Enter submits while focused.
    ///
    /// Returns the new row's ID when a row was created.
    pub fn new_row_key(&mut self, key: InputKey) -> Option<String> {
        let text = self.new_row.handle_key(key)?;
        self.create_row(&text)
    }

    /// Submit the new-row input. The input is cleared even when no row is
    /// created.
    pub fn submit_new_row(&mut self) -> Option<String> {
        let text = self.new_row.take();
        self.create_row(&text)
    }

    /// Create a row using the currently selected template.
    pub fn add_row(&mut self, name: &str) -> Option<String> {
        self.create_row(name)
    }

    fn create_row(&mut self, name: &str) -> Option<String> {
        let config = self.config.effective();
        self.rows.add_row(name, &self.columns, &config, &self.templates)
    }

    // =========================================================================
    // Templates
    // =========================================================================

    /// Select the template for future rows. `None` or blank clears it.
    pub fn select_template(&mut self, template: Option<&str>) {
        self.config.select_template(template);
    }

    /// Make a template available, replacing one with the same ID.
    pub fn register_template(&mut self, template: RowTemplate) {
        self.templates.register(template);
    }

    // =========================================================================
    // Render
    // =========================================================================

    /// Repair drifted state, derive the view, and return the frame.
    pub fn render(&mut self) -> RenderSnapshot<'_> {
        let perf = PerfSpan::new("render");
        let config = self.config.effective();

        self.repair();

        let view = pipeline::derive(
            self.rows.rows(),
            &self.columns,
            &self.sort,
            &self.filter,
            Pagination::new(config.pagination_size, self.page_index),
        );
        if view.page.index != self.page_index {
            tracing::debug!(
                target: "horizon_grid::session",
                requested = self.page_index,
                clamped = view.page.index,
                "page index clamped"
            );
            self.page_index = view.page.index;
            self.view_changed.emit(ViewChange::Page(self.page_index));
        }
        self.last_page = Some(view.page);

        if config.enable_debug_mode {
            tracing::debug!(
                target: "horizon_grid::session",
                total = view.total_rows,
                filtered = view.filtered_rows,
                shown = view.len(),
                page = view.page.index,
                pages = view.page.count,
                elapsed_us = perf.elapsed().as_micros() as u64,
                "render"
            );
        }

        let columns = self
            .column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
            .map(|column| self.column_state(column))
            .collect();

        RenderSnapshot {
            columns,
            rows: view.rows(self.rows.rows()).collect(),
            total_rows: view.total_rows,
            filtered_rows: view.filtered_rows,
            page: view.page,
            filter: &self.filter,
            cell_size: config.cell_size,
            sticky_first_column: config.sticky_first_column,
            template_options: self.templates.options(),
            selected_template: config.current_row_template,
            new_row_text: self.new_row.text(),
        }
    }

    fn column_state<'a>(&'a self, column: &'a Column) -> ColumnState<'a> {
        let width = self
            .resize
            .pending_width(&column.id)
            .map_or(column.width, |pending| column.clamp_width(pending));
        ColumnState {
            id: &column.id,
            label: &column.label,
            kind: column.kind,
            width,
            resize: self.resize.phase(&column.id),
            visible: column.visible,
            sortable: column.sortable,
            sort: self.sort.direction_of(&column.id),
            sort_priority: self.sort.priority_of(&column.id),
        }
    }

    fn repair(&mut self) {
        self.reconcile_column_order();

        let pruned = self.sort.prune(&self.columns);
        if pruned > 0 {
            tracing::debug!(target: "horizon_grid::session", pruned, "sort keys for removed columns pruned");
            self.view_changed.emit(ViewChange::Sort(self.sort.clone()));
        }

        let stale: Vec<String> = self
            .resize
            .sizing_state()
            .filter(|(column, _)| !self.columns.contains(column))
            .map(|(column, _)| column.to_string())
            .collect();
        for column in stale {
            self.resize.cancel(&column);
        }
    }

    /// Resynchronize the cached display order when columns were added or
    /// removed since it was taken.
    fn reconcile_column_order(&mut self) {
        let registry = self.columns.columns();
        let in_sync = self.column_order.len() == registry.len() && {
            let cached: HashSet<&str> = self.column_order.iter().map(String::as_str).collect();
            registry.iter().all(|c| cached.contains(c.id.as_str()))
        };
        if !in_sync {
            tracing::debug!(
                target: "horizon_grid::session",
                cached = self.column_order.len(),
                current = registry.len(),
                "column order resynchronized"
            );
            self.column_order = self.columns.ordered_ids();
        }
    }

    // =========================================================================
    // Debugging
    // =========================================================================

    /// The full internal view state as JSON, when `enable_show_state` is on.
    pub fn state_dump(&self) -> Option<String> {
        let config = self.config.effective();
        if !config.enable_show_state {
            return None;
        }
        let dump = StateDump {
            columns: self.columns.columns(),
            column_order: &self.column_order,
            rows: self.rows.rows(),
            sort: &self.sort,
            filter: &self.filter,
            page_index: self.page_index,
            sizing: self.resize.sizing_state().collect(),
            config,
            new_row: &self.new_row,
        };
        match serde_json::to_string_pretty(&dump) {
            Ok(json) => Some(json),
            Err(err) => {
                tracing::warn!(target: "horizon_grid::session", %err, "state dump failed");
                None
            }
        }
    }
}

impl Drop for TableSession {
    fn drop(&mut self) {
        let dropped = self.resize.clear();
        if dropped > 0 {
            tracing::debug!(target: "horizon_grid::session", dropped, "pending width commits dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;
    use crate::controller::RESIZE_COMMIT_DELAY;

    fn session() -> TableSession {
        TableSession::new(
            [
                ColumnDef::new("name"),
                ColumnDef::new("status"),
                ColumnDef::new("estimate").kind(ColumnKind::Number),
            ],
            [
                Row::new("a").with("name", "Write docs").with("status", "todo").with("estimate", 3),
                Row::new("b").with("name", "Fix bug").with("status", "done").with("estimate", 1),
                Row::new("c").with("name", "Review").with("status", "todo"),
            ],
            ConfigStore::default(),
            TemplateRegistry::with_templates([RowTemplate::new("task", "Task").with_default("status", "todo")]),
        )
    }

    #[test]
    fn test_render_defaults() {
        let mut session = session();
        let snapshot = session.render();
        assert_eq!(snapshot.row_ids(), vec!["a", "b", "c"]);
        assert_eq!(snapshot.total_rows, 3);
        assert_eq!(snapshot.filtered_rows, 3);
        assert_eq!(snapshot.columns.len(), 3);
        assert_eq!(snapshot.cell_size, CellSize::Normal);
        assert_eq!(snapshot.template_options.len(), 1);
    }

    #[test]
    fn test_sort_indicators() {
        let mut session = session();
        session.toggle_sort("estimate", false);
        session.toggle_sort("name", true);

        let snapshot = session.render();
        assert_eq!(snapshot.row_ids(), vec!["b", "a", "c"]);
        let estimate = &snapshot.columns[2];
        assert_eq!(estimate.sort, Some(SortDirection::Ascending));
        assert_eq!(estimate.sort_priority, Some(0));
        assert_eq!(snapshot.columns[0].sort_priority, Some(1));
        assert_eq!(snapshot.columns[1].sort, None);
    }

    #[test]
    fn test_removed_column_is_repaired() {
        let mut session = session();
        session.toggle_sort("status", false);
        assert!(session.remove_column("status"));

        let snapshot = session.render();
        assert_eq!(snapshot.columns.len(), 2);
        assert!(snapshot.rows.iter().all(|r| r.get("status").is_none()));
        assert!(session.sort().is_empty());
    }

    #[test]
    fn test_added_column_appears_after_render() {
        let mut session = session();
        session.add_column(ColumnDef::new("owner"));
        let ids: Vec<&str> = session.render().columns.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["name", "status", "estimate", "owner"]);
        assert_eq!(session.reorder_columns("owner", "name"), vec!["owner", "name", "status", "estimate"]);
    }

    #[test]
    fn test_pending_width_is_rendered_before_commit() {
        let mut session = session();
        let start = Instant::now();
        session.begin_resize("name");
        session.resize_move("name", 50.0, start);

        assert_eq!(session.render().columns[0].width, 150.0);
        assert_eq!(session.columns().get("name").unwrap().width, 100.0);

        session.release_resize("name");
        assert_eq!(session.tick(start + RESIZE_COMMIT_DELAY), vec![("name".to_string(), 150.0)]);
        assert_eq!(session.columns().get("name").unwrap().width, 150.0);
    }

    #[test]
    fn test_submit_new_row_with_template() {
        let mut session = session();
        session.select_template(Some("task"));
        session.set_new_row_input("Ship it");
        assert_eq!(session.submit_new_row().as_deref(), Some("Ship it"));
        assert_eq!(session.new_row_input().text(), "");

        let row = session.rows().get("Ship it").unwrap();
        assert_eq!(row.get("status"), Some(&CellValue::from("todo")));
        assert_eq!(row.get("name"), Some(&CellValue::from("Ship it")));
    }

    #[test]
    fn test_blank_submission_clears_input() {
        let mut session = session();
        session.focus_new_row_input(true);
        session.set_new_row_input("  ");
        assert_eq!(session.new_row_key(InputKey::Enter), None);
        assert_eq!(session.new_row_input().text(), "");
        assert_eq!(session.rows().len(), 3);
    }

    #[test]
    fn test_set_cell_respects_known_columns() {
        let mut session = session();
        session.set_cell("c", "estimate", 5);
        session.set_cell("c", "missing", 5);
        session.set_cell("missing", "estimate", 5);
        let row = session.rows().get("c").unwrap();
        assert_eq!(row.get("estimate"), Some(&CellValue::from(5)));
        assert_eq!(row.fields().len(), 3);
        assert!(session.try_set_cell("c", "missing", 1).is_err());
    }

    #[test]
    fn test_page_navigation() {
        let mut session = TableSession::new(
            [ColumnDef::new("name")],
            (0..25).map(|i| Row::new(format!("r{i}")).with("name", i)),
            ConfigStore::with_overrides(
                TableConfig::default(),
                ConfigOverrides {
                    pagination_size: Some(10),
                    ..Default::default()
                },
            ),
            TemplateRegistry::new(),
        );

        assert_eq!(session.render().page.count, 3);
        session.next_page();
        session.next_page();
        session.next_page();
        session.render();
        assert_eq!(session.page_index(), 2);
        assert!(!session.render().page.has_next());

        session.prev_page();
        assert_eq!(session.render().page.index, 1);
    }

    #[test]
    fn test_prev_page_steps_back_from_requested_page() {
        let mut session = TableSession::new(
            [ColumnDef::new("name")],
            (0..25).map(|i| Row::new(format!("r{i}")).with("name", i)),
            ConfigStore::with_overrides(
                TableConfig::default(),
                ConfigOverrides {
                    pagination_size: Some(10),
                    ..Default::default()
                },
            ),
            TemplateRegistry::new(),
        );

        assert_eq!(session.render().page.index, 0);
        session.set_page(2);
        session.prev_page();
        assert_eq!(session.page_index(), 1);

        // Rows removed after the last render: the step is clamped on render.
        session.set_page(2);
        for i in 10..25 {
            session.remove_row(&format!("r{i}"));
        }
        session.prev_page();
        assert_eq!(session.page_index(), 1);
        assert_eq!(session.render().page.index, 0);
        assert_eq!(session.page_index(), 0);
    }

    #[test]
    fn test_state_dump_requires_flag() {
        let mut session = session();
        assert!(session.state_dump().is_none());

        session.config().set_show_state(true);
        let dump = session.state_dump().unwrap();
        let value: serde_json::Value = serde_json::from_str(&dump).unwrap();
        assert_eq!(value["column_order"][0], "name");
        assert_eq!(value["rows"].as_array().unwrap().len(), 3);

        session.set_filter("x");
        assert!(session.state_dump().unwrap().contains("\"filter\": \"x\""));
    }
}
