// 🚨 Pipeline Errors
// Typed failures surfaced by the reconciliation pipeline

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    /// A required column is absent from an input table (the SchemaError)
    #[error("{table} table is missing required column '{column}'")]
    Schema { table: String, column: String },

    /// A row does not line up with the table header
    #[error("row {row} of {table} table has {found} cells, expected {expected}")]
    RowWidth {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl ReconcileError {
    pub fn schema(table: &str, column: &str) -> Self {
        ReconcileError::Schema {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, ReconcileError::Schema { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
