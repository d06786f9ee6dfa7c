//! Command line front end: metadata checks and reject list upkeep.

mod check;
mod cli;
mod logging;
mod rejects;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use batch_engine::RejectListStore;
use batch_logging::batch_debug;
use clap::Parser;

use cli::{Cli, Command};
use settings::{load_settings, SETTINGS_FILENAME};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILENAME));
    let loaded = load_settings(&settings_path);
    logging::initialize(loaded.settings.log_destination, cli.verbose);
    loaded.log();
    let settings = loaded.settings;
    batch_debug!("Parsed arguments: {:?}", cli);

    let rejects_path = cli
        .rejects
        .clone()
        .unwrap_or_else(|| settings.rejects_path.clone());
    let store = RejectListStore::new(rejects_path);

    match cli.command {
        Command::Check { urls_file, report } => {
            check::run(&urls_file, report.as_deref(), &settings, &store).await
        }
        Command::Rejects { action } => rejects::run(action, &store, &settings.reject_reasons),
    }
}
