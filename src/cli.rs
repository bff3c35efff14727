//! Command-line interface for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing (`organize`, `list`, `classify`)
//! - Configuration loading
//! - Logging setup
//! - Rendering engine results through [`OutputFormatter`]

use crate::config::{Config, ConfigError};
use crate::error::FilesystemError;
use crate::file_entry::{SortKey, list_directory, sort_entries, summarize};
use crate::file_organizer::{OrganizeEvent, Organizer};
use crate::output::OutputFormatter;
use clap::{ArgAction, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// List a directory or sort its files into category subdirectories.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Configuration file (defaults to .dirsortrc.toml, then ~/.config/dirsort/config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Move the files of a directory into category subdirectories.
    Organize {
        directory: PathBuf,

        /// Show what would be moved without moving anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// List the entries of a directory.
    List {
        directory: PathBuf,

        #[arg(long, value_enum, default_value_t = SortKey::NameAsc)]
        sort: SortKey,

        /// Print the entries as a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// Print the category each file name would be sorted into.
    Classify {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

/// Errors that end a CLI invocation with a nonzero exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error("Failed to serialize listing: {0}")]
    Json(#[from] serde_json::Error),
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks warn, info or debug
/// for this crate.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "dirsort=warn",
        1 => "dirsort=info",
        _ => "dirsort=debug",
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs a parsed command line.
///
/// Per-file move failures are reported but still return `Ok`; only an
/// unusable target directory or bad configuration is an error.
pub fn run(cli: Cli) -> Result<(), CliError> {
    run_command(cli.command, cli.config.as_deref())
}

/// Runs a single command with an optional configuration file.
pub fn run_command(command: Command, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = Config::load(config_path)?;

    match command {
        Command::Organize { directory, dry_run } => {
            let organizer = Organizer::new(config.category_table()?, config.compile_filters()?);
            if dry_run {
                organize_dry_run(&organizer, &directory)
            } else {
                organize_directory(&organizer, &directory)
            }
        }
        Command::List {
            directory,
            sort,
            json,
        } => list(&directory, sort, json),
        Command::Classify { names } => {
            let table = config.category_table()?;
            for name in &names {
                OutputFormatter::plain(&format!("{}\t{}", name, table.classify(name)));
            }
            Ok(())
        }
    }
}

fn organize_directory(organizer: &Organizer, dir: &Path) -> Result<(), CliError> {
    OutputFormatter::info(&format!("Organizing contents of: {}", dir.display()));

    let mut progress = None;
    let report = organizer.organize_with_progress(dir, |event| match event {
        OrganizeEvent::Started { total } => {
            progress = Some(OutputFormatter::create_progress_bar(total as u64));
        }
        OrganizeEvent::Moved(moved) => {
            if let Some(pb) = &progress {
                pb.set_message(moved.category.clone());
                pb.inc(1);
            }
        }
        OrganizeEvent::Failed(_) => {
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }
    })?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if report.moved.is_empty() && report.failures.is_empty() {
        OutputFormatter::plain("No files were found that needed to be organized.");
        return Ok(());
    }

    let mut category_counts = BTreeMap::new();
    for moved in &report.moved {
        let file_name = moved
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        OutputFormatter::success(&format!("{}/{}", moved.category, file_name));
        *category_counts.entry(moved.category.clone()).or_insert(0) += 1;
    }

    for failure in &report.failures {
        OutputFormatter::error(&failure.to_string());
    }

    OutputFormatter::summary_table(&category_counts, report.moved_count());

    if report.is_complete_success() {
        OutputFormatter::success(&format!(
            "Organized {} file(s) into categories.",
            report.moved_count()
        ));
    } else {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. Please review the errors above.",
            report.failures.len()
        ));
    }

    Ok(())
}

fn organize_dry_run(organizer: &Organizer, dir: &Path) -> Result<(), CliError> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", dir.display()));

    let plan = organizer.plan(dir)?;
    if plan.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    let mut category_counts = BTreeMap::new();
    for planned in &plan {
        let from = planned
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let to = planned
            .destination
            .strip_prefix(planned.source.parent().unwrap_or(dir))
            .unwrap_or(&planned.destination);
        OutputFormatter::plain(&format!(" - {} → {}", from, to.display()));
        *category_counts.entry(planned.category.clone()).or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&category_counts, plan.len());
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn list(dir: &Path, sort: SortKey, json: bool) -> Result<(), CliError> {
    let entries = sort_entries(list_directory(dir)?, sort);

    if json {
        OutputFormatter::plain(&serde_json::to_string_pretty(&entries)?);
    } else {
        OutputFormatter::entry_table(&entries, &summarize(&entries));
    }

    Ok(())
}
