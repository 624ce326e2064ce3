//! Cell values and column value kinds.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A value stored in a row cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// An unset value.
    #[default]
    Null,
    /// A boolean value.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string value.
    Text(String),
}

impl CellValue {
    /// Returns true for `Null` and for text that is empty after trimming.
    pub fn is_unset(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a string slice, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(v) => write!(f, "{v}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

/// The declared value type of a column, which decides how it sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Lexicographic comparison after trimming and lowercasing.
    #[default]
    Text,
    /// Numeric comparison. Text cells holding a number are parsed.
    Number,
    /// `false` sorts before `true`.
    Boolean,
}

/// A cell value normalized for comparison under a column kind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl ColumnKind {
    /// Normalize a cell for sorting. `None` means the value is unset.
    pub(crate) fn sort_value(self, value: Option<&CellValue>) -> Option<SortValue> {
        let value = value.filter(|v| !v.is_unset())?;
        match self {
            ColumnKind::Text => Some(SortValue::Text(value.to_string().trim().to_lowercase())),
            ColumnKind::Number => match value {
                CellValue::Number(n) if !n.is_nan() => Some(SortValue::Number(*n)),
                CellValue::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| !n.is_nan())
                    .map(SortValue::Number),
                _ => None,
            },
            ColumnKind::Boolean => match value {
                CellValue::Bool(b) => Some(SortValue::Bool(*b)),
                CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(SortValue::Bool(true)),
                    "false" => Some(SortValue::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
        }
    }
}

impl SortValue {
    pub(crate) fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Bool(a), SortValue::Bool(b)) => a.cmp(b),
            // A column normalizes every cell to one variant.
            _ => Ordering::Equal,
        }
    }
}
