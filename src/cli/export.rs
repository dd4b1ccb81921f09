//! CLI commands for spreadsheet export
//!
//! Runs exports, lists and prunes stored export files, and copies an export
//! out of the store.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;

use crate::config::Settings;
use crate::display::export::{format_export_list, format_export_summary};
use crate::error::{OrderError, OrderResult};
use crate::export::ExportService;
use crate::storage::{FsArtifactStore, Storage};

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export all orders and line items to a new spreadsheet
    Run,

    /// Copy an export file out of the store
    Download {
        /// Export file name as printed by `export run` or `export list`
        file: String,

        /// Output path (defaults to the file name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored export files
    List,

    /// Apply the retention policy now
    Prune,
}

/// Handle export commands
pub fn handle_export_command(
    storage: &Storage,
    artifacts: &FsArtifactStore,
    settings: &Settings,
    cmd: ExportCommands,
) -> OrderResult<()> {
    let service = ExportService::from_settings(storage, artifacts, &settings.export);

    match cmd {
        ExportCommands::Run => {
            let summary = service.export()?;
            print!("{}", format_export_summary(&summary));
        }

        ExportCommands::Download { file, output } => {
            let bytes = service.download(&file)?;
            let output = output.unwrap_or_else(|| PathBuf::from(&file));
            fs::write(&output, &bytes).map_err(|e| {
                OrderError::Io(format!("Failed to write {}: {}", output.display(), e))
            })?;
            println!("Saved {} ({} bytes) to {}", file, bytes.len(), output.display());
        }

        ExportCommands::List => {
            print!("{}", format_export_list(&service.list()?));
        }

        ExportCommands::Prune => {
            let removed = service.prune(Local::now().naive_local())?;
            if removed.is_empty() {
                println!("Nothing to prune.");
            } else {
                for name in &removed {
                    println!("Removed {}", name);
                }
            }
        }
    }

    Ok(())
}
