//! Row templates: named default-value sets applied when a row is created.
//!
//! The selected template ID picks a [`RowDefaults`] strategy. Having no
//! template selected is itself a strategy ([`RowDefaults::Identity`]) that
//! leaves the new row empty apart from its identity field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::column::ColumnRegistry;
use crate::value::CellValue;

/// A named set of default field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowTemplate {
    pub id: String,
    pub label: String,
    /// Default values keyed by column ID.
    #[serde(default)]
    pub defaults: BTreeMap<String, CellValue>,
}

impl RowTemplate {
    /// Create a template with no defaults.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            defaults: BTreeMap::new(),
        }
    }

    /// Add a default value for a column.
    pub fn with_default(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.defaults.insert(column.into(), value.into());
        self
    }
}

/// One entry of the template selection input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOption {
    pub label: String,
    pub value: String,
}

/// How fields of a newly created row are populated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowDefaults<'a> {
    /// No defaults.
    Identity,
    /// Copy the template's defaults.
    Template(&'a RowTemplate),
}

impl RowDefaults<'_> {
    /// Fill `fields` with defaults for the columns present in `known`.
    ///
    /// Defaults for unknown columns are dropped.
    pub fn populate(&self, fields: &mut BTreeMap<String, CellValue>, known: &ColumnRegistry) {
        let RowDefaults::Template(template) = self else {
            return;
        };
        for (column, value) in &template.defaults {
            if known.contains(column) {
                fields.insert(column.clone(), value.clone());
            } else {
                tracing::debug!(target: "horizon_grid::rows", template = %template.id, %column, "template default for unknown column dropped");
            }
        }
    }
}

/// The templates available to a table session.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<RowTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of templates.
    pub fn with_templates(templates: impl IntoIterator<Item = RowTemplate>) -> Self {
        let mut registry = Self::new();
        for template in templates {
            registry.register(template);
        }
        registry
    }

    /// Add a template, replacing any template with the same ID.
    pub fn register(&mut self, template: RowTemplate) {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    pub fn get(&self, id: &str) -> Option<&RowTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Options for the template selection input, in registration order.
    pub fn options(&self) -> Vec<TemplateOption> {
        self.templates
            .iter()
            .map(|t| TemplateOption {
                label: t.label.clone(),
                value: t.id.clone(),
            })
            .collect()
    }

    /// Resolve the selected template ID to a defaulting strategy.
    ///
    /// No selection, a blank selection, and an unknown ID all resolve to
    /// [`RowDefaults::Identity`].
    pub fn strategy(&self, selected: Option<&str>) -> RowDefaults<'_> {
        let Some(id) = selected.map(str::trim).filter(|id| !id.is_empty()) else {
            return RowDefaults::Identity;
        };
        match self.get(id) {
            Some(template) => RowDefaults::Template(template),
            None => {
                tracing::warn!(target: "horizon_grid::rows", %id, "selected row template not found");
                RowDefaults::Identity
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;

    fn templates() -> TemplateRegistry {
        TemplateRegistry::with_templates([
            RowTemplate::new("task", "Task")
                .with_default("status", "todo")
                .with_default("unknown", 1),
            RowTemplate::new("note", "Note"),
        ])
    }

    #[test]
    fn test_options() {
        assert_eq!(
            templates().options(),
            vec![
                TemplateOption {
                    label: "Task".into(),
                    value: "task".into()
                },
                TemplateOption {
                    label: "Note".into(),
                    value: "note".into()
                },
            ]
        );
    }

    #[test]
    fn test_strategy_resolution() {
        let templates = templates();
        assert_eq!(templates.strategy(None), RowDefaults::Identity);
        assert_eq!(templates.strategy(Some("  ")), RowDefaults::Identity);
        assert_eq!(templates.strategy(Some("missing")), RowDefaults::Identity);
        assert!(matches!(
            templates.strategy(Some("task")),
            RowDefaults::Template(t) if t.id == "task"
        ));
    }

    #[test]
    fn test_populate_drops_unknown_columns() {
        let templates = templates();
        let known = ColumnRegistry::from_defs([ColumnDef::new("name"), ColumnDef::new("status")]);
        let mut fields = BTreeMap::new();
        templates.strategy(Some("task")).populate(&mut fields, &known);

        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("status"), Some(&CellValue::from("todo")));
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut templates = templates();
        templates.register(RowTemplate::new("note", "Meeting note"));
        assert_eq!(templates.len(), 2);
        assert_eq!(templates.get("note").unwrap().label, "Meeting note");
    }
}
