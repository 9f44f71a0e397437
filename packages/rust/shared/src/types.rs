//! Core domain types shared across the assetporter crates.

use serde::{Deserialize, Serialize};

/// Final tally of a migration run, reported to the user and serializable
/// for the CLI's `--summary-json` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// Distinct remote references found across the whole corpus.
    pub unique_references: usize,
    /// References fetched over the network and persisted this run.
    pub fetched: usize,
    /// References whose asset already existed in the storage root (no
    /// network call).
    pub already_present: usize,
    /// References whose fetch failed; kept as remote URLs in the output.
    pub failed: usize,
    /// Records read and rewritten.
    pub records: usize,
    /// Wall-clock duration of the run, in milliseconds.
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serialization() {
        let summary = MigrationSummary {
            unique_references: 12,
            fetched: 9,
            already_present: 2,
            failed: 1,
            records: 40,
            elapsed_ms: 1500,
        };

        let json = serde_json::to_string(&summary).expect("serialize");
        let parsed: MigrationSummary = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.unique_references, 12);
        assert_eq!(parsed.fetched + parsed.already_present + parsed.failed, 12);
    }
}
