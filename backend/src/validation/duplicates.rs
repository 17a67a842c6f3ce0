//! Cross-row duplicate detection.
//!
//! Rows are keyed by `docType/pid`, stable-sorted by key and scanned for
//! runs of equal keys. Within a run the earliest row is kept and every
//! later row is marked as its duplicate.

use std::collections::BTreeSet;

use crate::models::Row;

/// Flag duplicate rows and return the duplicated identities.
///
/// Identities are upper-cased when `case_insensitive` is set. An empty set
/// means no duplicates. Must run once per row set, after all rows exist.
pub fn detect_duplicates(rows: &mut [Row], case_insensitive: bool) -> BTreeSet<String> {
    let keyed = keyed_rows(rows.iter().enumerate(), case_insensitive);

    let mut duplicates = BTreeSet::new();
    for run in duplicate_runs(&keyed) {
        let first_index = rows[run[0].1].index();
        for (_, pos) in &run[1..] {
            rows[*pos].mark_as_duplicate_of(first_index);
        }
        duplicates.insert(run[0].0.clone());
    }
    duplicates
}

/// Identities claimed by more than one rule-producing row.
///
/// Rows that are invalid or disabled never become rules, so a disabled row
/// sharing its identity with the enabled row that replaces it is not a
/// conflict. Rows are left untouched.
pub fn conflicting_rules(rows: &[Row], case_insensitive: bool) -> BTreeSet<String> {
    let producing = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.is_valid_and_enabled());
    let keyed = keyed_rows(producing, case_insensitive);

    duplicate_runs(&keyed)
        .map(|run| run[0].0.clone())
        .collect()
}

fn keyed_rows<'a>(
    rows: impl Iterator<Item = (usize, &'a Row)>,
    case_insensitive: bool,
) -> Vec<(String, usize)> {
    let mut keyed: Vec<(String, usize)> = rows
        .map(|(pos, row)| (row.identity(case_insensitive), pos))
        .collect();
    // Stable: rows sharing a key stay in reading order
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed
}

/// Runs of two or more equal keys in a sorted slice.
fn duplicate_runs(keyed: &[(String, usize)]) -> impl Iterator<Item = &[(String, usize)]> {
    let mut runs = Vec::new();
    let mut start = 0;
    while start < keyed.len() {
        let mut end = start + 1;
        while end < keyed.len() && keyed[end].0 == keyed[start].0 {
            end += 1;
        }
        if end - start > 1 {
            runs.push(&keyed[start..end]);
        }
        start = end;
    }
    runs.into_iter()
}
