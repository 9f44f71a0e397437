//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use assetporter_core::pipeline::{MigrateConfig, ProgressReporter};
use assetporter_shared::{
    AppConfig, MigrationSettings, MigrationSummary, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// assetporter — migrate a corpus's remote assets into local storage.
#[derive(Parser)]
#[command(
    name = "assetporter",
    version,
    about = "Rewrite remote asset references in a content corpus into local, content-addressed copies.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Migrate a dataset's remote assets into local storage.
    Migrate {
        /// Input dataset (CSV with a header row).
        input: PathBuf,

        /// Output dataset path; the storage directory is created beside it.
        output: PathBuf,

        /// Storage directory name for downloaded assets.
        #[arg(long)]
        images_dir: Option<String>,

        /// Maximum concurrent fetches.
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// End-to-end timeout per fetch, in seconds.
        #[arg(short, long)]
        timeout_secs: Option<u64>,

        /// Primary image column name.
        #[arg(long)]
        primary_column: Option<String>,

        /// Body columns to scan (comma-separated). Defaults to all columns.
        #[arg(long)]
        body_columns: Option<String>,

        /// Print the final tally as JSON instead of the text summary.
        #[arg(long)]
        summary_json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "assetporter=info",
        1 => "assetporter=debug",
        _ => "assetporter=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Migrate {
            input,
            output,
            images_dir,
            concurrency,
            timeout_secs,
            primary_column,
            body_columns,
            summary_json,
        } => {
            cmd_migrate(
                input,
                output,
                images_dir,
                concurrency,
                timeout_secs,
                primary_column,
                body_columns,
                summary_json,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_migrate(
    input: PathBuf,
    output: PathBuf,
    images_dir: Option<String>,
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
    primary_column: Option<String>,
    body_columns: Option<String>,
    summary_json: bool,
) -> Result<()> {
    let config = load_config()?;
    let mut settings = MigrationSettings::from(&config);

    // CLI flags override config file values.
    if let Some(dir) = images_dir {
        settings.storage_dir = dir;
    }
    if let Some(n) = concurrency {
        settings.concurrency = n;
    }
    if let Some(secs) = timeout_secs {
        settings.fetch_timeout_secs = secs;
    }
    if let Some(col) = primary_column {
        settings.primary_column = col;
    }
    if let Some(cols) = body_columns {
        settings.body_columns = cols
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
    }

    info!(
        input = %input.display(),
        output = %output.display(),
        concurrency = settings.concurrency,
        "starting migration"
    );

    let migrate_config = MigrateConfig {
        input,
        output,
        settings,
    };

    let reporter = CliProgress::new();
    let summary = assetporter_core::pipeline::migrate(&migrate_config, &reporter).await?;

    if summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("  Migration complete!");
    println!("  Unique references: {}", summary.unique_references);
    println!("  Fetched:           {}", summary.fetched);
    println!("  Already present:   {}", summary.already_present);
    println!("  Failed (kept):     {}", summary.failed);
    println!("  Records:           {}", summary.records);
    println!(
        "  Time:              {:.1}s",
        summary.elapsed_ms as f64 / 1000.0
    );
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn assets_processed(&self, completed: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching assets [{completed}/{total}]"));
    }

    fn done(&self, _summary: &MigrationSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
