//! assetporter CLI — archive a content corpus's remote images locally.
//!
//! Rewrites every externally hosted asset reference in a record-oriented
//! dataset into a locally stored, content-addressed copy.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
