//! Shared types, error model, and configuration for assetporter.
//!
//! This crate is the foundation depended on by all other assetporter crates.
//! It provides:
//! - [`AssetPorterError`] — the unified error type
//! - Configuration ([`AppConfig`], [`MigrationSettings`], config loading)
//! - The [`MigrationSummary`] run tally

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DatasetConfig, DefaultsConfig, MigrationSettings, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{AssetPorterError, Result};
pub use types::MigrationSummary;
