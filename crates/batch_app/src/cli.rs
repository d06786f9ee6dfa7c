//! Command line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fetch story metadata in cancellable batches and manage the reject list.
#[derive(Parser, Debug)]
#[command(name = "batch_app")]
#[command(author, version, about)]
pub struct Cli {
    /// RON settings file
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Reject list file, overriding the settings
    #[arg(long, global = true)]
    pub rejects: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch metadata for every URL in a file, one per line
    Check {
        urls_file: PathBuf,
        /// Write a JSON report of the run here
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Inspect or edit the reject list
    Rejects {
        #[command(subcommand)]
        action: RejectsCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum RejectsCommand {
    /// Print every record
    List,
    /// Add or replace a record
    Add {
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        note: Option<String>,
        /// Reason appended to the note
        #[arg(long)]
        reason: Option<String>,
    },
    /// Remove the record for a URL
    Remove { url: String },
    /// Rewrite the file with canonical URLs, dropping invalid lines
    Normalize,
    /// Write the list as JSON
    Export { path: PathBuf },
    /// Merge records from a JSON file
    Import { path: PathBuf },
    /// Print the preset reject reasons
    Reasons,
}
