// 📋 Tabular Model - Ordered columns, row-major cells
// Tables are read by column name for keys and by column position for projections

use crate::error::{ReconcileError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CELL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Blank spreadsheet cell or empty CSV field
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Blank strings become `Empty`, everything else is kept verbatim
    pub fn from_text(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Equality key where `Empty` equals `Empty` (duplicate detection)
    pub fn key(&self) -> CellKey {
        match self {
            Cell::Empty => CellKey::Empty,
            Cell::Text(s) => CellKey::Text(s.clone()),
            Cell::Number(n) => CellKey::Number(number_bits(*n)),
            Cell::Bool(b) => CellKey::Bool(*b),
        }
    }

    /// Equality key for joins: `Empty` never matches anything
    pub fn join_key(&self) -> Option<CellKey> {
        match self {
            Cell::Empty => None,
            other => Some(other.key()),
        }
    }
}

fn number_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from_text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Hashable, typed cell identity. Text never equals a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Empty,
    Text(String),
    Number(u64),
    Bool(bool),
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    /// Table identity used in error messages (bulk, payment, statement, ...)
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Unchecked serde shape; rows are validated on the way into `Table`
#[derive(Deserialize)]
struct RawTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TryFrom<RawTable> for Table {
    type Error = ReconcileError;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::from_rows(raw.name, raw.columns, raw.rows)
    }
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Table {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self> {
        let mut table = Table::new(name, columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Rows built from this table's own header, already the right width
    pub(crate) fn from_parts(name: &str, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Table {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// Convenience constructor for all-text tables
    pub fn from_text_rows(name: &str, columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|v| Cell::from_text(v)).collect())
            .collect();
        Table::from_rows(name, columns, rows)
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ReconcileError::RowWidth {
                table: self.name.clone(),
                row: self.rows.len() + 1,
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Cell>] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of the first column with this name
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| ReconcileError::schema(&self.name, column))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Positional projection. Positions may repeat; out-of-range positions
    /// yield an unnamed column of empty cells.
    pub fn select_positions(&self, name: &str, positions: &[usize]) -> Table {
        let columns = positions
            .iter()
            .map(|&p| self.columns.get(p).cloned().unwrap_or_default())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|&p| row.get(p).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Table::from_parts(name, columns, rows)
    }

    pub fn select_named(&self, name: &str, columns: &[String]) -> Result<Table> {
        let positions = columns
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.select_positions(name, &positions))
    }

    /// Append a column computed from each existing row
    pub fn with_computed_column<F>(mut self, column: &str, mut compute: F) -> Table
    where
        F: FnMut(&[Cell]) -> Cell,
    {
        for row in self.rows.iter_mut() {
            let value = compute(row);
            row.push(value);
        }
        self.columns.push(column.to_string());
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
