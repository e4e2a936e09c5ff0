// Payment Reconciliation - Core Library
// Matches bulk payment, payment status and bank statement exports

pub mod config;         // Column names, sentinel, projection mode
pub mod deduplication;  // Duplicate key collapsing
pub mod error;          // ReconcileError (SchemaError and friends)
pub mod extraction;     // Narrative -> reference token
pub mod join;           // Inner join with pandas-style suffixes
pub mod loader;         // CSV / spreadsheet boundary
pub mod reconciliation; // Two-stage pipeline
pub mod table;          // Cells and tables

// Re-export commonly used types
pub use config::{ColumnNames, PipelineConfig, ProjectionMode};
pub use deduplication::{DeduplicationEngine, DuplicateMatch};
pub use error::ReconcileError;
pub use extraction::{extract_reference_token, ReferenceToken, TokenExtractor};
pub use join::inner_join;
pub use loader::{
    detect_format, load_table, write_csv, write_table, write_xlsx, OutputFormat, SourceFormat,
    FINAL_OUTPUT_FILE, INTERMEDIATE_OUTPUT_FILE,
};
pub use reconciliation::{
    FinalStats, FinalTable, IntermediateStats, IntermediateTable, PipelineWarning,
    Reconciliation, ReconciliationEngine, ReconciliationReport, Stage,
};
pub use table::{Cell, CellKey, Table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reconcile with the default configuration
pub fn reconcile(
    bulk: &Table,
    payment: &Table,
    statement: &Table,
) -> Result<Reconciliation, ReconcileError> {
    ReconciliationEngine::new().reconcile(bulk, payment, statement)
}
