//! Record rewriting: apply the completed mapping back onto the corpus.
//!
//! Replacement is exact-substring, global within each field, and literal —
//! a reference is never interpreted as a pattern, so reserved characters in
//! URLs need no escaping. Identity entries (failed fetches) leave their text
//! byte-identical. The input dataset is not mutated; fields are copied by
//! value and the output has the same shape, order, and record count.

use std::collections::HashMap;

use tracing::debug;

use assetporter_dataset::{Dataset, Record};

/// Rewrite every occurrence of every mapped reference within the scanned
/// columns of every record.
///
/// Entries are applied longest-reference-first so that one reference being a
/// prefix of another can never mangle the longer occurrence.
pub fn rewrite_dataset(
    dataset: &Dataset,
    mapping: &HashMap<String, String>,
    scan_columns: &[usize],
) -> Dataset {
    // Identity entries are no-ops; drop them up front.
    let mut replacements: Vec<(&str, &str)> = mapping
        .iter()
        .filter(|(reference, local)| reference != local)
        .map(|(reference, local)| (reference.as_str(), local.as_str()))
        .collect();
    replacements.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));

    debug!(
        replacements = replacements.len(),
        scan_columns = scan_columns.len(),
        records = dataset.records.len(),
        "rewriting records"
    );

    let records = dataset
        .records
        .iter()
        .map(|record| {
            let mut values = record.values.clone();
            for &col in scan_columns {
                if let Some(field) = values.get_mut(col) {
                    rewrite_field(field, &replacements);
                }
            }
            Record { values }
        })
        .collect();

    Dataset {
        headers: dataset.headers.clone(),
        records,
    }
}

/// Replace all mapped references inside one field, in place.
fn rewrite_field(field: &mut String, replacements: &[(&str, &str)]) {
    // Remote references always carry a scheme; fields without one are
    // untouched and skip the scan entirely.
    if !field.contains("http") {
        return;
    }

    for (reference, local) in replacements {
        if field.contains(reference) {
            *field = field.replace(reference, local);
        }
    }
}
