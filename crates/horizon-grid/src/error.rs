//! Error types for the table engine.
//!
//! These errors are produced by the `try_*` methods on the stores. The public
//! action methods never return them: they log the error and turn the action
//! into a no-op, so an interactive gesture can never abort a render.

/// Result type alias for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors that can occur while mutating table state.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A column ID that is not in the registry.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// A row ID that is not in the store.
    #[error("Unknown row '{0}'")]
    UnknownRow(String),

    /// A column with this ID already exists.
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    /// A row with this ID already exists.
    #[error("Row '{0}' already exists")]
    DuplicateRow(String),

    /// A new row was requested with an empty or blank name.
    #[error("Row name is empty")]
    BlankRowName,

    /// A sort was requested on a column that is not sortable.
    #[error("Column '{0}' is not sortable")]
    NotSortable(String),

    /// A configuration payload could not be decoded or encoded.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl TableError {
    /// Create an unknown-column error.
    pub fn unknown_column(id: impl Into<String>) -> Self {
        Self::UnknownColumn(id.into())
    }

    /// Create an unknown-row error.
    pub fn unknown_row(id: impl Into<String>) -> Self {
        Self::UnknownRow(id.into())
    }

    /// Whether this error is an invalid reference to a column or row.
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, Self::UnknownColumn(_) | Self::UnknownRow(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TableError::unknown_column("status").to_string(),
            "Unknown column 'status'"
        );
        assert_eq!(TableError::BlankRowName.to_string(), "Row name is empty");
    }

    #[test]
    fn test_invalid_reference_classification() {
        assert!(TableError::unknown_row("a.md").is_invalid_reference());
        assert!(!TableError::DuplicateRow("a.md".into()).is_invalid_reference());
    }
}
