// 🔗 Inner Join
// Key-based join of two tables, left columns first then right columns

use crate::table::{Cell, CellKey, Table};
use std::collections::{HashMap, HashSet};

/// Suffixes applied to column names present on both sides of a join
pub const LEFT_SUFFIX: &str = "_x";
pub const RIGHT_SUFFIX: &str = "_y";

/// Inner join on `left[left_key] == right[right_key]`.
///
/// Row order follows the left table; each left row is followed by its
/// matches in right-table order. Empty keys never match. Key comparison is
/// typed, so a text key never equals a numeric one.
pub fn inner_join(
    left: &Table,
    left_key: usize,
    right: &Table,
    right_key: usize,
    name: &str,
) -> Table {
    let mut index: HashMap<CellKey, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(key) = row[right_key].join_key() {
            index.entry(key).or_default().push(i);
        }
    }

    let mut rows: Vec<Vec<Cell>> = Vec::new();

    for left_row in left.rows() {
        let Some(key) = left_row[left_key].join_key() else {
            continue;
        };
        let Some(matches) = index.get(&key) else {
            continue;
        };

        for &j in matches {
            let mut row: Vec<Cell> = Vec::with_capacity(left.width() + right.width());
            row.extend(left_row.iter().cloned());
            row.extend(right.rows()[j].iter().cloned());
            rows.push(row);
        }
    }

    Table::from_parts(name, joined_columns(left.columns(), right.columns()), rows)
}

fn joined_columns(left: &[String], right: &[String]) -> Vec<String> {
    let left_names: HashSet<&String> = left.iter().collect();
    let right_names: HashSet<&String> = right.iter().collect();

    let left_cols = left.iter().map(|c| {
        if right_names.contains(c) {
            format!("{}{}", c, LEFT_SUFFIX)
        } else {
            c.clone()
        }
    });
    let right_cols = right.iter().map(|c| {
        if left_names.contains(c) {
            format!("{}{}", c, RIGHT_SUFFIX)
        } else {
            c.clone()
        }
    });

    left_cols.chain(right_cols).collect()
}

// ============================================================================
// TESTS
// ============================================================================
