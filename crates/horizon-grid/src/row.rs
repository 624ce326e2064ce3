//! Row store: the row records of one table session.
//!
//! Rows keep their fields keyed by column ID. Field keys are always a subset
//! of the column registry's IDs; a column without a value renders as empty.
//! A row's ID never changes after creation. Field values are edited in place
//! by cell-edit collaborators through [`RowStore::row_mut`].

use std::collections::BTreeMap;

use horizon_grid_core::Signal;
use serde::{Deserialize, Serialize};

use crate::column::ColumnRegistry;
use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::template::TemplateRegistry;
use crate::value::CellValue;

/// Field that receives a new row's name unless configured otherwise.
pub const DEFAULT_IDENTITY_FIELD: &str = "name";

/// A row record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    id: String,
    #[serde(default)]
    fields: BTreeMap<String, CellValue>,
}

impl Row {
    /// Create a row with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// All field values keyed by column ID.
    pub fn fields(&self) -> &BTreeMap<String, CellValue> {
        &self.fields
    }

    /// The value in a column, if set.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    /// Set a field value, returning the previous one.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Option<CellValue> {
        self.fields.insert(column.into(), value.into())
    }

    /// Clear a field.
    pub fn clear(&mut self, column: &str) -> Option<CellValue> {
        self.fields.remove(column)
    }

    /// Drop fields whose column is not in the registry.
    fn retain_known(&mut self, known: &ColumnRegistry) {
        let before = self.fields.len();
        self.fields.retain(|column, _| known.contains(column));
        let dropped = before - self.fields.len();
        if dropped > 0 {
            tracing::trace!(target: "horizon_grid::rows", id = %self.id, dropped, "dropped fields for unknown columns");
        }
    }
}

/// A change notification emitted by [`RowStore::changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowChange {
    Added(String),
    Removed(String),
}

/// The authoritative store of row records for one table session.
#[derive(Debug)]
pub struct RowStore {
    rows: Vec<Row>,
    identity_field: String,
    changed: Signal<RowChange>,
}

impl Default for RowStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_FIELD)
    }
}

impl RowStore {
    /// Create an empty store whose new rows write their name to `identity_field`.
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            identity_field: identity_field.into(),
            changed: Signal::new(),
        }
    }

    /// Ingest rows from the data source, in order.
    ///
    /// Fields for unknown columns are stripped and rows repeating an earlier
    /// ID are skipped.
    pub fn load(&mut self, rows: impl IntoIterator<Item = Row>, known: &ColumnRegistry) {
        for mut row in rows {
            if self.contains(&row.id) {
                tracing::warn!(target: "horizon_grid::rows", id = %row.id, "duplicate row skipped");
                continue;
            }
            row.retain_known(known);
            self.rows.push(row);
        }
        tracing::debug!(target: "horizon_grid::rows", count = self.rows.len(), "rows loaded");
    }

    /// The change notification signal.
    pub fn changed(&self) -> &Signal<RowChange> {
        &self.changed
    }

    /// The field a new row's name is written to.
    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in natural order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Mutable access for cell-edit collaborators.
    pub fn row_mut(&mut self, id: &str) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Create a row named `name_or_key`, populated from the selected template.
    ///
    /// Returns the new row's ID.
    pub fn try_add_row(
        &mut self,
        name_or_key: &str,
        known: &ColumnRegistry,
        config: &TableConfig,
        templates: &TemplateRegistry,
    ) -> Result<String> {
        let name = name_or_key.trim();
        if name.is_empty() {
            return Err(TableError::BlankRowName);
        }
        if self.contains(name) {
            return Err(TableError::DuplicateRow(name.to_string()));
        }

        let strategy = templates.strategy(config.current_row_template.as_deref());
        let mut fields = BTreeMap::new();
        strategy.populate(&mut fields, known);
        if known.contains(&self.identity_field) {
            fields.insert(self.identity_field.clone(), CellValue::from(name));
        }

        let id = name.to_string();
        self.rows.push(Row {
            id: id.clone(),
            fields,
        });
        tracing::debug!(target: "horizon_grid::rows", %id, template = ?config.current_row_template, "row added");
        self.changed.emit(RowChange::Added(id.clone()));
        Ok(id)
    }

    /// Create a row; blank or duplicate names create nothing.
    pub fn add_row(
        &mut self,
        name_or_key: &str,
        known: &ColumnRegistry,
        config: &TableConfig,
        templates: &TemplateRegistry,
    ) -> Option<String> {
        match self.try_add_row(name_or_key, known, config, templates) {
            Ok(id) => Some(id),
            Err(TableError::BlankRowName) => {
                tracing::debug!(target: "horizon_grid::rows", "blank row name ignored");
                None
            }
            Err(err) => {
                tracing::warn!(target: "horizon_grid::rows", %err, "add_row ignored");
                None
            }
        }
    }

    /// Remove a row by ID.
    pub fn try_remove_row(&mut self, id: &str) -> Result<Row> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| TableError::unknown_row(id))?;
        let row = self.rows.remove(index);
        tracing::debug!(target: "horizon_grid::rows", %id, "row removed");
        self.changed.emit(RowChange::Removed(row.id.clone()));
        Ok(row)
    }

    /// Remove a row; an unknown ID is logged and ignored.
    pub fn remove_row(&mut self, id: &str) -> Option<Row> {
        match self.try_remove_row(id) {
            Ok(row) => Some(row),
            Err(err) => {
                tracing::warn!(target: "horizon_grid::rows", %err, "remove_row ignored");
                None
            }
        }
    }

    /// Strip fields for columns that left the registry.
    pub(crate) fn retain_known(&mut self, known: &ColumnRegistry) {
        for row in &mut self.rows {
            row.retain_known(known);
        }
    }
}
