//! Application configuration for assetporter.
//!
//! User config lives at `~/.assetporter/assetporter.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AssetPorterError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "assetporter.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".assetporter";

// ---------------------------------------------------------------------------
// Config structs (matching assetporter.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Migration defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Dataset column layout.
    #[serde(default)]
    pub dataset: DatasetConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum concurrent asset fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// End-to-end timeout per fetch (including redirect hops), in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Maximum redirect hops per fetch before giving up.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Storage root directory for downloaded assets, relative to the
    /// output dataset's directory.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Emit a progress callback every N completed references.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_redirects: default_max_redirects(),
            storage_dir: default_storage_dir(),
            progress_interval: default_progress_interval(),
        }
    }
}

fn default_concurrency() -> usize {
    15
}
fn default_fetch_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    10
}
fn default_storage_dir() -> String {
    "images".into()
}
fn default_progress_interval() -> usize {
    25
}

/// `[dataset]` section — which columns carry asset references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Column holding the record's primary image as a bare URL (no markup).
    #[serde(default = "default_primary_column")]
    pub primary_column: String,

    /// Free-text columns to scan for embedded references.
    /// Empty means every column except the primary is scanned.
    #[serde(default)]
    pub body_columns: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            primary_column: default_primary_column(),
            body_columns: Vec::new(),
        }
    }
}

fn default_primary_column() -> String {
    "cover_image".into()
}

// ---------------------------------------------------------------------------
// Migration settings (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime migration settings — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct MigrationSettings {
    /// Maximum concurrent asset fetches.
    pub concurrency: usize,
    /// End-to-end timeout per fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Maximum redirect hops per fetch.
    pub max_redirects: usize,
    /// Storage root directory name.
    pub storage_dir: String,
    /// Progress callback interval (completed references).
    pub progress_interval: usize,
    /// Primary image column name.
    pub primary_column: String,
    /// Body columns to scan (empty = all non-primary columns).
    pub body_columns: Vec<String>,
}

impl From<&AppConfig> for MigrationSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: config.defaults.concurrency,
            fetch_timeout_secs: config.defaults.fetch_timeout_secs,
            max_redirects: config.defaults.max_redirects,
            storage_dir: config.defaults.storage_dir.clone(),
            progress_interval: config.defaults.progress_interval,
            primary_column: config.dataset.primary_column.clone(),
            body_columns: config.dataset.body_columns.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.assetporter/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AssetPorterError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.assetporter/assetporter.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AssetPorterError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        AssetPorterError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AssetPorterError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AssetPorterError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AssetPorterError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
