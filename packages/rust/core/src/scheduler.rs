//! Bounded-concurrency fetch scheduling.
//!
//! Drives the deduplicated reference set through the fetcher under a
//! concurrency cap and produces the complete reference → local-path mapping.
//! Each reference is owned by exactly one task, so no mapping key is ever
//! written twice; the map itself lives on the coordinator, which records
//! entries as completions arrive.
//!
//! A fetch failure is terminal for that reference within the run: the
//! identity fallback (the original remote URL) is installed and every other
//! reference proceeds. Individual asset failures never abort the run.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use assetporter_fetch::Fetcher;
use assetporter_store::AssetStore;

/// Completed mapping plus per-outcome tallies.
#[derive(Debug, Default)]
pub struct MappingResult {
    /// Reference → local path, or reference → itself on failure.
    pub mapping: HashMap<String, String>,
    /// References fetched over the network this run.
    pub fetched: usize,
    /// References skipped because their asset already existed locally.
    pub already_present: usize,
    /// References whose fetch failed (identity fallback installed).
    pub failed: usize,
}

/// What one spawned fetch task produced.
enum TaskOutcome {
    Fetched(String),
    Failed(String),
}

/// Observational progress callback: `(completed, total)`.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Fetch every reference at most once, respecting the concurrency cap.
///
/// References whose derived filename already exists in the store are mapped
/// immediately without any network work — this is what makes interrupted
/// migrations cheaply restartable. `on_progress` fires every
/// `progress_interval` completed references and once more at the end.
pub async fn build_mapping(
    references: &BTreeSet<String>,
    fetcher: &Fetcher,
    store: &AssetStore,
    concurrency: usize,
    progress_interval: usize,
    on_progress: ProgressFn<'_>,
) -> MappingResult {
    let total = references.len();
    let interval = progress_interval.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut result = MappingResult::default();
    let mut completed = 0usize;
    let mut tasks: JoinSet<(String, TaskOutcome)> = JoinSet::new();

    info!(unique_references = total, concurrency, "scheduling fetches");

    for reference in references {
        let filename = AssetStore::local_identity(reference);

        // Existence check first: cheap, no network, frees the slot for a
        // reference that actually needs fetching.
        if store.contains(&filename) {
            let local = store.local_path(&filename);
            debug!(reference, local, "already present, skipping fetch");
            result.mapping.insert(reference.clone(), local);
            result.already_present += 1;
            completed += 1;
            if completed % interval == 0 || completed == total {
                on_progress(completed, total);
            }
            continue;
        }

        let reference = reference.clone();
        let fetcher = fetcher.clone();
        let store = store.clone();
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");

            let outcome = match fetcher.fetch(&reference).await {
                Ok(bytes) => match store.persist(&filename, &bytes) {
                    Ok(local) => TaskOutcome::Fetched(local),
                    Err(e) => TaskOutcome::Failed(format!("persist failed: {e}")),
                },
                Err(e) => TaskOutcome::Failed(e.to_string()),
            };

            (reference, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((reference, TaskOutcome::Fetched(local))) => {
                debug!(reference, local, "fetched");
                result.mapping.insert(reference, local);
                result.fetched += 1;
            }
            Ok((reference, TaskOutcome::Failed(reason))) => {
                warn!(reference, reason, "fetch failed, keeping remote URL");
                result.mapping.insert(reference.clone(), reference);
                result.failed += 1;
            }
            Err(e) => {
                // The task itself never panics; a join error would still be
                // repaired by the completeness sweep below.
                warn!(error = %e, "fetch task aborted");
            }
        }

        completed += 1;
        if completed % interval == 0 || completed == total {
            on_progress(completed, total);
        }
    }

    // Completeness invariant: every reference gets exactly one entry by the
    // time rewriting starts, even if a task was lost.
    for reference in references {
        if !result.mapping.contains_key(reference) {
            warn!(reference, "no outcome recorded, installing identity fallback");
            result.mapping.insert(reference.clone(), reference.clone());
            result.failed += 1;
        }
    }

    info!(
        fetched = result.fetched,
        already_present = result.already_present,
        failed = result.failed,
        "mapping complete"
    );

    result
}
