//! Migration pipeline orchestration for assetporter.
//!
//! Ties the extractor, fetcher, and asset store together: the scheduler
//! drives the unique reference set under a concurrency cap, the rewriter
//! applies the resulting mapping back onto the corpus, and [`pipeline::migrate`]
//! runs the whole thing end to end.

pub mod pipeline;
pub mod rewrite;
pub mod scheduler;

pub use pipeline::{MigrateConfig, ProgressReporter, SilentProgress, migrate};
pub use rewrite::rewrite_dataset;
pub use scheduler::{MappingResult, build_mapping};
