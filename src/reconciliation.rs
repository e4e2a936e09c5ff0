// ⚖️ Reconciliation Engine - Cross-match payments against bank confirmations
//
// Stage 1: payment ⋈ bulk on REMARKS = Beneficiary Addr. Line 3,
//          dedup on (REMARKS, AMOUNT), sentinel UTR -> REFERENCE NUMBER
// Stage 2: statement narrative -> utr1 token, statement ⋈ stage 1 on utr1 = UTR NUMBER
//
// Every run builds fresh tables; nothing is mutated after it is returned.

use crate::config::{PipelineConfig, ProjectionMode};
use crate::deduplication::DeduplicationEngine;
use crate::error::Result;
use crate::extraction::{ReferenceToken, TokenExtractor};
use crate::join::inner_join;
use crate::table::{Cell, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const INTERMEDIATE_TABLE: &str = "intermediate";
pub const FINAL_TABLE: &str = "final";

// ============================================================================
// STAGE OUTPUTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Intermediate,
    Final,
}

impl Stage {
    pub fn name(&self) -> &str {
        match self {
            Stage::Intermediate => "intermediate",
            Stage::Final => "final",
        }
    }
}

/// Non-fatal conditions the caller may want to show the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineWarning {
    /// A join matched no rows; the stage output is an empty table
    EmptyResult { stage: Stage },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::EmptyResult { stage } => {
                write!(f, "{} join produced no rows", stage.name())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediateStats {
    pub bulk_rows: usize,
    pub payment_rows: usize,
    /// Rows after the join, before dedup
    pub joined_rows: usize,
    pub duplicates_removed: usize,
    pub sentinel_replacements: usize,
}

/// Output of stage 1.
///
/// `table()` is the exported projection. The full deduplicated, normalized
/// join is kept as the stage 2 join source, so `UTR NUMBER` can be matched
/// even when it sits outside the projected columns.
#[derive(Debug, Clone)]
pub struct IntermediateTable {
    table: Table,
    joined: Table,
    utr_position: usize,
    pub stats: IntermediateStats,
}

impl IntermediateTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Deduplicated and normalized join, before projection
    pub fn joined(&self) -> &Table {
        &self.joined
    }

    pub fn utr_values(&self) -> Vec<&Cell> {
        self.joined
            .rows()
            .iter()
            .map(|row| &row[self.utr_position])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalStats {
    pub statement_rows: usize,
    pub tokens_delimited: usize,
    pub tokens_after_underscore: usize,
    pub tokens_absent: usize,
}

impl FinalStats {
    fn record(&mut self, token: &ReferenceToken) {
        match token {
            ReferenceToken::Delimited(_) => self.tokens_delimited += 1,
            ReferenceToken::AfterUnderscore(_) => self.tokens_after_underscore += 1,
            ReferenceToken::Absent => self.tokens_absent += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FinalTable {
    table: Table,
    pub stats: FinalStats,
}

impl FinalTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub intermediate: IntermediateStats,
    pub intermediate_rows: usize,
    pub final_stats: FinalStats,
    pub final_rows: usize,
    pub warnings: Vec<PipelineWarning>,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation: {} payments x {} bulk -> {} intermediate \
             ({} duplicates dropped, {} UTRs filled); \
             {} statement lines -> {} final ({} without token)",
            self.intermediate.payment_rows,
            self.intermediate.bulk_rows,
            self.intermediate_rows,
            self.intermediate.duplicates_removed,
            self.intermediate.sentinel_replacements,
            self.final_stats.statement_rows,
            self.final_rows,
            self.final_stats.tokens_absent,
        )
    }
}

/// Both exported tables plus what happened on the way
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub intermediate: IntermediateTable,
    pub final_table: FinalTable,
    pub report: ReconciliationReport,
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

struct PaymentColumns {
    remarks: usize,
    amount: usize,
    utr: usize,
    reference: usize,
}

pub struct ReconciliationEngine {
    config: PipelineConfig,
    extractor: TokenExtractor,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            config: PipelineConfig::default(),
            extractor: TokenExtractor::new(),
        }
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(ReconciliationEngine {
            config,
            extractor: TokenExtractor::new(),
        })
    }

    fn bulk_key(&self, bulk: &Table) -> Result<usize> {
        bulk.require_column(&self.config.columns.bulk_address)
    }

    fn payment_columns(&self, payment: &Table) -> Result<PaymentColumns> {
        let names = &self.config.columns;
        Ok(PaymentColumns {
            remarks: payment.require_column(&names.payment_remarks)?,
            amount: payment.require_column(&names.payment_amount)?,
            utr: payment.require_column(&names.payment_utr)?,
            reference: payment.require_column(&names.payment_reference)?,
        })
    }

    fn narrative_column(&self, statement: &Table) -> Result<usize> {
        statement.require_column(&self.config.columns.statement_narrative)
    }

    /// Stage 1: join payments to bulk rows, collapse duplicate
    /// (REMARKS, AMOUNT) pairs, fill sentinel UTRs and project.
    pub fn build_intermediate(&self, bulk: &Table, payment: &Table) -> Result<IntermediateTable> {
        let bulk_key = self.bulk_key(bulk)?;
        let cols = self.payment_columns(payment)?;

        // Payment columns come first, so payment positions hold in the join
        let joined = inner_join(payment, cols.remarks, bulk, bulk_key, INTERMEDIATE_TABLE);
        let joined_rows = joined.len();
        debug!(joined_rows, "payment x bulk join");

        let dedup = DeduplicationEngine::new(vec![cols.remarks, cols.amount]);
        let (mut joined, duplicates) = dedup.drop_duplicates(&joined);

        let sentinel_replacements = self.fill_sentinel_utrs(&mut joined, &cols);

        let table = match &self.config.projection {
            ProjectionMode::Positional {
                intermediate_leading,
                ..
            } => {
                let width = joined.width();
                let positions: Vec<usize> = (0..(*intermediate_leading).min(width))
                    .chain(width.checked_sub(1))
                    .collect();
                joined.select_positions(INTERMEDIATE_TABLE, &positions)
            }
            ProjectionMode::Named {
                intermediate_columns,
                ..
            } => joined.select_named(INTERMEDIATE_TABLE, intermediate_columns)?,
        };

        let stats = IntermediateStats {
            bulk_rows: bulk.len(),
            payment_rows: payment.len(),
            joined_rows,
            duplicates_removed: duplicates.len(),
            sentinel_replacements,
        };

        info!(
            rows = table.len(),
            duplicates = stats.duplicates_removed,
            filled = stats.sentinel_replacements,
            "intermediate table built"
        );

        Ok(IntermediateTable {
            table,
            joined,
            utr_position: cols.utr,
            stats,
        })
    }

    /// Replace sentinel UTRs with the row's reference number
    fn fill_sentinel_utrs(&self, joined: &mut Table, cols: &PaymentColumns) -> usize {
        let mut replaced = 0;
        for row in joined.rows_mut() {
            let is_sentinel =
                matches!(&row[cols.utr], Cell::Text(utr) if utr.trim() == self.config.sentinel);
            if is_sentinel {
                row[cols.utr] = row[cols.reference].clone();
                replaced += 1;
            }
        }
        replaced
    }

    pub fn extract_reference_token(&self, narrative: &str) -> ReferenceToken {
        self.extractor.extract(narrative)
    }

    /// Stage 2: derive a token per statement line and join it to the
    /// stage 1 UTR NUMBER.
    pub fn build_final(
        &self,
        statement: &Table,
        intermediate: &IntermediateTable,
    ) -> Result<FinalTable> {
        let narrative = self.narrative_column(statement)?;

        let mut stats = FinalStats {
            statement_rows: statement.len(),
            ..FinalStats::default()
        };

        let token_position = statement.width();
        let tokenized = statement
            .clone()
            .with_computed_column(&self.config.token_column, |row| {
                let token = self.extractor.extract_cell(&row[narrative]);
                stats.record(&token);
                token.into_cell()
            });

        let joined = inner_join(
            &tokenized,
            token_position,
            &intermediate.joined,
            intermediate.utr_position,
            FINAL_TABLE,
        );

        let table = match &self.config.projection {
            ProjectionMode::Positional { final_width, .. } => {
                let positions: Vec<usize> = (0..(*final_width).min(joined.width())).collect();
                joined.select_positions(FINAL_TABLE, &positions)
            }
            ProjectionMode::Named { final_columns, .. } => {
                joined.select_named(FINAL_TABLE, final_columns)?
            }
        };

        info!(
            rows = table.len(),
            absent = stats.tokens_absent,
            "final table built"
        );

        Ok(FinalTable { table, stats })
    }

    /// Run both stages. All inputs are checked before any join, so a
    /// schema failure never leaves partial output behind.
    pub fn reconcile(
        &self,
        bulk: &Table,
        payment: &Table,
        statement: &Table,
    ) -> Result<Reconciliation> {
        self.bulk_key(bulk)?;
        self.payment_columns(payment)?;
        self.narrative_column(statement)?;

        let intermediate = self.build_intermediate(bulk, payment)?;
        let final_table = self.build_final(statement, &intermediate)?;

        let mut warnings = Vec::new();
        if intermediate.is_empty() {
            warnings.push(PipelineWarning::EmptyResult {
                stage: Stage::Intermediate,
            });
        }
        if final_table.is_empty() {
            warnings.push(PipelineWarning::EmptyResult { stage: Stage::Final });
        }
        for w in &warnings {
            warn!("{}", w);
        }

        let report = ReconciliationReport {
            intermediate: intermediate.stats.clone(),
            intermediate_rows: intermediate.len(),
            final_stats: final_table.stats.clone(),
            final_rows: final_table.len(),
            warnings,
            reconciled_at: Utc::now(),
        };

        Ok(Reconciliation {
            intermediate,
            final_table,
            report,
        })
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
