// 🔍 Deduplication Engine - Collapse repeated key tuples
// Keeps the first row for each key, in table order

use crate::table::{CellKey, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// DUPLICATE MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// Row that survives
    pub kept_index: usize,

    /// Row that repeats the key of `kept_index`
    pub dropped_index: usize,

    /// Human-readable reason
    pub reason: String,
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

pub struct DeduplicationEngine {
    /// Column positions that together form the duplicate key
    key_positions: Vec<usize>,
}

impl DeduplicationEngine {
    pub fn new(key_positions: Vec<usize>) -> Self {
        DeduplicationEngine { key_positions }
    }

    /// Find every row whose key already appeared earlier.
    /// Blank cells compare equal to each other here.
    pub fn find_duplicates(&self, table: &Table) -> Vec<DuplicateMatch> {
        let mut first_seen: HashMap<Vec<CellKey>, usize> = HashMap::new();
        let mut matches = Vec::new();

        for (i, row) in table.rows().iter().enumerate() {
            let key: Vec<CellKey> = self.key_positions.iter().map(|&p| row[p].key()).collect();

            match first_seen.get(&key) {
                Some(&kept) => {
                    let shown: Vec<String> =
                        self.key_positions.iter().map(|&p| row[p].to_string()).collect();
                    matches.push(DuplicateMatch {
                        kept_index: kept,
                        dropped_index: i,
                        reason: format!("Duplicate key: {}", shown.join(" | ")),
                    });
                }
                None => {
                    first_seen.insert(key, i);
                }
            }
        }

        matches
    }

    /// Returns the table without duplicate rows, plus what was dropped
    pub fn drop_duplicates(&self, table: &Table) -> (Table, Vec<DuplicateMatch>) {
        let duplicates = self.find_duplicates(table);
        let mut dropped = vec![false; table.len()];
        for m in &duplicates {
            dropped[m.dropped_index] = true;
        }

        let rows = table
            .rows()
            .iter()
            .zip(&dropped)
            .filter(|(_, is_dropped)| !**is_dropped)
            .map(|(row, _)| row.clone())
            .collect();
        let kept = Table::from_parts(table.name(), table.columns().to_vec(), rows);

        (kept, duplicates)
    }
}

// ============================================================================
// TESTS
// ============================================================================
