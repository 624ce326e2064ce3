//! Configuration store: display preferences for one table view.
//!
//! Settings come in two layers. [`TableConfig`] holds the process-wide
//! defaults; [`ConfigOverrides`] holds what a single view changed. The
//! effective configuration is the defaults with the overrides applied.
//!
//! The store never touches disk. Collaborators that persist settings connect
//! to [`ConfigStore::changed`], which carries the new effective configuration
//! after every change, and hand serialized payloads back through
//! [`ConfigOverrides::from_json`].
//!
//! ```
//! use horizon_grid::config::{CellSize, ConfigStore, TableConfig};
//!
//! let store = ConfigStore::new(TableConfig::default());
//! store.changed().connect(|config| {
//!     println!("persist: {:?}", config.cell_size);
//! });
//!
//! store.set_cell_size(CellSize::Wide);
//! assert_eq!(store.effective().cell_size, CellSize::Wide);
//! ```

use horizon_grid_core::{Property, Signal};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Row height preset. Affects rendering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSize {
    Compact,
    #[default]
    Normal,
    Wide,
}

/// Effective display preferences for a table view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub cell_size: CellSize,
    /// Keep the first visible column pinned while scrolling.
    pub sticky_first_column: bool,
    /// Template applied to rows created from now on.
    pub current_row_template: Option<String>,
    /// Log counts and timing for every render.
    pub enable_debug_mode: bool,
    /// Allow dumping the full internal view state.
    pub enable_show_state: bool,
    /// Rows per page. `None` shows every row.
    pub pagination_size: Option<usize>,
}

impl TableConfig {
    /// Decode a configuration payload. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str::<Self>(json)?.normalized())
    }

    /// Encode this configuration.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply a view's overrides on top of these defaults.
    pub fn merged(&self, overrides: &ConfigOverrides) -> TableConfig {
        TableConfig {
            cell_size: overrides.cell_size.unwrap_or(self.cell_size),
            sticky_first_column: overrides
                .sticky_first_column
                .unwrap_or(self.sticky_first_column),
            current_row_template: match &overrides.current_row_template {
                Some(id) => Some(id.clone()),
                None => self.current_row_template.clone(),
            },
            enable_debug_mode: overrides.enable_debug_mode.unwrap_or(self.enable_debug_mode),
            enable_show_state: overrides.enable_show_state.unwrap_or(self.enable_show_state),
            pagination_size: match overrides.pagination_size {
                Some(size) => Some(size),
                None => self.pagination_size,
            },
        }
        .normalized()
    }

    /// Blank template IDs and a page size of zero mean "none".
    fn normalized(mut self) -> Self {
        self.current_row_template = self
            .current_row_template
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        self.pagination_size = self.pagination_size.filter(|&size| size > 0);
        self
    }
}

/// Settings one view changed relative to the defaults.
///
/// An empty template ID and a page size of zero are explicit "none" values
/// that override a default template or page size.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_size: Option<CellSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky_first_column: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_row_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_debug_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_show_state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_size: Option<usize>,
}

impl ConfigOverrides {
    /// Decode an overrides payload.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode these overrides.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Configuration for one table view, with change notification.
#[derive(Debug)]
pub struct ConfigStore {
    defaults: TableConfig,
    overrides: Property<ConfigOverrides>,
    changed: Signal<TableConfig>,
}

impl ConfigStore {
    /// Create a store with no view overrides.
    pub fn new(defaults: TableConfig) -> Self {
        Self::with_overrides(defaults, ConfigOverrides::default())
    }

    /// Create a store from defaults and previously persisted overrides.
    pub fn with_overrides(defaults: TableConfig, overrides: ConfigOverrides) -> Self {
        Self {
            defaults: defaults.normalized(),
            overrides: Property::new(overrides),
            changed: Signal::new(),
        }
    }

    /// Emitted with the new effective configuration after every change.
    pub fn changed(&self) -> &Signal<TableConfig> {
        &self.changed
    }

    /// The process-wide defaults.
    pub fn defaults(&self) -> &TableConfig {
        &self.defaults
    }

    /// The view's overrides.
    pub fn overrides(&self) -> ConfigOverrides {
        self.overrides.get()
    }

    /// The defaults with the view's overrides applied.
    pub fn effective(&self) -> TableConfig {
        self.overrides.with(|o| self.defaults.merged(o))
    }

    pub fn set_cell_size(&self, size: CellSize) {
        self.apply("cell_size", |o| o.cell_size = Some(size));
    }

    pub fn set_sticky_first_column(&self, sticky: bool) {
        self.apply("sticky_first_column", |o| o.sticky_first_column = Some(sticky));
    }

    /// Select the template for future rows. `None` or a blank ID clears it.
    pub fn select_template(&self, template: Option<&str>) {
        let id = template.map(str::trim).unwrap_or_default().to_string();
        self.apply("current_row_template", |o| o.current_row_template = Some(id));
    }

    pub fn set_debug_mode(&self, enabled: bool) {
        self.apply("enable_debug_mode", |o| o.enable_debug_mode = Some(enabled));
    }

    pub fn set_show_state(&self, enabled: bool) {
        self.apply("enable_show_state", |o| o.enable_show_state = Some(enabled));
    }

    /// Set rows per page. `None` turns pagination off.
    pub fn set_pagination_size(&self, size: Option<usize>) {
        self.apply("pagination_size", |o| {
            o.pagination_size = Some(size.unwrap_or(0))
        });
    }

    /// Replace all overrides at once.
    pub fn replace_overrides(&self, overrides: ConfigOverrides) {
        self.apply("overrides", |o| *o = overrides);
    }

    fn apply<F>(&self, setting: &'static str, f: F)
    where
        F: FnOnce(&mut ConfigOverrides),
    {
        let before = self.effective();
        if !self.overrides.update(f) {
            return;
        }
        let after = self.effective();
        if after != before {
            tracing::debug!(target: "horizon_grid::config", setting, "configuration changed");
            self.changed.emit(after);
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}
