//! End-to-end migration pipeline: dataset → extract → fetch → rewrite → dataset.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use assetporter_dataset::Dataset;
use assetporter_fetch::Fetcher;
use assetporter_shared::{AssetPorterError, MigrationSettings, MigrationSummary, Result};
use assetporter_store::AssetStore;

use crate::rewrite;
use crate::scheduler;

/// Configuration for one migration run.
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    /// Input dataset path (CSV, read once).
    pub input: PathBuf,
    /// Output dataset path (CSV, written once, atomically).
    pub output: PathBuf,
    /// Runtime settings merged from config file + CLI flags.
    pub settings: MigrationSettings,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called at fixed completion-count intervals while assets are processed.
    fn assets_processed(&self, completed: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &MigrationSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn assets_processed(&self, _completed: usize, _total: usize) {}
    fn done(&self, _summary: &MigrationSummary) {}
}

/// Run the full migration.
///
/// 1. Read the input dataset
/// 2. Extract the corpus-wide unique reference set
/// 3. Fetch-and-persist each unique reference under the concurrency cap
/// 4. Rewrite every record against the completed mapping
/// 5. Write the output dataset atomically
///
/// Per-reference fetch failures degrade to identity fallbacks; only dataset
/// read/write failures abort the run.
#[instrument(skip_all, fields(input = %config.input.display(), output = %config.output.display()))]
pub async fn migrate(
    config: &MigrateConfig,
    progress: &dyn ProgressReporter,
) -> Result<MigrationSummary> {
    let start = Instant::now();
    let settings = &config.settings;

    // --- Phase 1: Read dataset ---
    progress.phase("Reading dataset");
    let dataset = Dataset::read(&config.input)?;

    let columns = ScanColumns::resolve(&dataset, settings)?;

    // --- Phase 2: Extract references ---
    progress.phase("Extracting references");
    let references = collect_references(&dataset, &columns);
    info!(
        unique_references = references.len(),
        records = dataset.records.len(),
        "extraction complete"
    );

    // --- Phase 3: Fetch assets ---
    progress.phase("Fetching assets");
    let storage_root = output_dir(&config.output).join(&settings.storage_dir);
    let store = AssetStore::new(storage_root);
    let fetcher = Fetcher::new(
        Duration::from_secs(settings.fetch_timeout_secs),
        settings.max_redirects,
    )?;

    let mapped = scheduler::build_mapping(
        &references,
        &fetcher,
        &store,
        settings.concurrency,
        settings.progress_interval,
        &|completed, total| progress.assets_processed(completed, total),
    )
    .await;

    // --- Phase 4: Rewrite records ---
    progress.phase("Rewriting records");
    let rewritten = rewrite::rewrite_dataset(&dataset, &mapped.mapping, &columns.all);

    // --- Phase 5: Write dataset ---
    progress.phase("Writing dataset");
    rewritten.write(&config.output)?;

    let summary = MigrationSummary {
        unique_references: references.len(),
        fetched: mapped.fetched,
        already_present: mapped.already_present,
        failed: mapped.failed,
        records: rewritten.records.len(),
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    progress.done(&summary);

    info!(
        unique_references = summary.unique_references,
        fetched = summary.fetched,
        already_present = summary.already_present,
        failed = summary.failed,
        records = summary.records,
        elapsed_ms = summary.elapsed_ms,
        "migration complete"
    );

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Column indices to scan, resolved from the settings against the header row.
struct ScanColumns {
    /// Primary-image column, when the dataset has one.
    primary: Option<usize>,
    /// Body columns carrying embedded markup.
    bodies: Vec<usize>,
    /// Union of the above, used by the rewriter.
    all: Vec<usize>,
}

impl ScanColumns {
    fn resolve(dataset: &Dataset, settings: &MigrationSettings) -> Result<Self> {
        let primary = dataset.column_index(&settings.primary_column);
        if primary.is_none() {
            debug!(
                column = %settings.primary_column,
                "no primary image column in dataset"
            );
        }

        let bodies: Vec<usize> = if settings.body_columns.is_empty() {
            // Default: scan everything except the primary column.
            (0..dataset.headers.len())
                .filter(|idx| Some(*idx) != primary)
                .collect()
        } else {
            settings
                .body_columns
                .iter()
                .map(|name| {
                    dataset.column_index(name).ok_or_else(|| {
                        AssetPorterError::validation(format!(
                            "column '{name}' not found in dataset header"
                        ))
                    })
                })
                .collect::<Result<_>>()?
        };

        let mut all = bodies.clone();
        if let Some(idx) = primary {
            all.push(idx);
        }

        Ok(Self {
            primary,
            bodies,
            all,
        })
    }
}

/// Corpus-wide unique reference set. `BTreeSet` keeps scheduling order
/// deterministic across runs.
fn collect_references(dataset: &Dataset, columns: &ScanColumns) -> BTreeSet<String> {
    let mut references = BTreeSet::new();

    for record in &dataset.records {
        if let Some(idx) = columns.primary {
            if let Some(field) = record.values.get(idx) {
                if let Some(reference) = assetporter_extract::primary_reference(field) {
                    references.insert(reference);
                }
            }
        }

        for &idx in &columns.bodies {
            if let Some(field) = record.values.get(idx) {
                references.extend(assetporter_extract::extract_references(field));
            }
        }
    }

    references
}

/// Directory the output dataset lands in; the storage root lives beside it.
fn output_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
