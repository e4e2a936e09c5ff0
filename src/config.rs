// ⚙️ Pipeline Configuration
// Column names, sentinel and projection shape. Defaults reproduce the
// bulk/payment/statement exports exactly; a JSON file may override any field.

use crate::error::ReconcileError;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SENTINEL: &str = "- -";
pub const DEFAULT_TOKEN_COLUMN: &str = "utr1";
pub const DEFAULT_INTERMEDIATE_LEADING: usize = 16;
pub const DEFAULT_FINAL_WIDTH: usize = 9;

// ============================================================================
// COLUMN NAMES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub bulk_address: String,
    pub payment_remarks: String,
    pub payment_amount: String,
    pub payment_utr: String,
    pub payment_reference: String,
    pub statement_narrative: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            bulk_address: "Beneficiary Addr. Line 3".to_string(),
            payment_remarks: "REMARKS".to_string(),
            payment_amount: "AMOUNT".to_string(),
            payment_utr: "UTR NUMBER".to_string(),
            payment_reference: "REFERENCE NUMBER".to_string(),
            statement_narrative: "Narrative".to_string(),
        }
    }
}

// ============================================================================
// PROJECTION MODE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProjectionMode {
    /// First N columns (+ last column for the intermediate table), by position
    Positional {
        intermediate_leading: usize,
        final_width: usize,
    },

    /// Explicit column lists, looked up by name in the joined tables
    Named {
        intermediate_columns: Vec<String>,
        final_columns: Vec<String>,
    },
}

impl Default for ProjectionMode {
    fn default() -> Self {
        ProjectionMode::Positional {
            intermediate_leading: DEFAULT_INTERMEDIATE_LEADING,
            final_width: DEFAULT_FINAL_WIDTH,
        }
    }
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnNames,

    /// UTR placeholder meaning "no UTR recorded" (compared after trimming)
    pub sentinel: String,

    /// Name of the column holding the token extracted from the narrative
    pub token_column: String,

    pub projection: ProjectionMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            columns: ColumnNames::default(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            token_column: DEFAULT_TOKEN_COLUMN.to_string(),
            projection: ProjectionMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: PipelineConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ReconcileError> {
        if self.token_column.is_empty() {
            return Err(ReconcileError::InvalidConfig(
                "token_column must not be empty".to_string(),
            ));
        }

        match &self.projection {
            ProjectionMode::Positional {
                intermediate_leading,
                final_width,
            } => {
                if *intermediate_leading == 0 || *final_width == 0 {
                    return Err(ReconcileError::InvalidConfig(
                        "positional widths must be at least 1".to_string(),
                    ));
                }
            }
            ProjectionMode::Named {
                intermediate_columns,
                final_columns,
            } => {
                if intermediate_columns.is_empty() || final_columns.is_empty() {
                    return Err(ReconcileError::InvalidConfig(
                        "named projection needs at least one column per table".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
