//! Output formatting and styling module.
//!
//! Everything the CLI prints goes through [`OutputFormatter`], so colors,
//! symbols and table layout live in one place.

use crate::file_entry::{FileEntry, ListingSummary};
use chrono::{DateTime, Local, Utc};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for an organize run over `total` files.
    ///
    /// The bar draws to stderr and stays hidden when stderr is not a terminal.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Prints a directory listing as a table followed by a status line.
    pub fn entry_table(entries: &[FileEntry], summary: &ListingSummary) {
        let name_width = entries
            .iter()
            .map(|e| display_name(e).chars().count())
            .max()
            .unwrap_or(0)
            .max(4);

        println!(
            "{:<name_width$}  {:>10}  {}",
            "Name".bold(),
            "Size".bold(),
            "Modified".bold(),
        );
        println!("{}", "-".repeat(name_width + 30));

        for entry in entries {
            let name = display_name(entry);
            let padded = format!("{:<name_width$}", name);
            let name = if entry.is_dir {
                padded.blue().bold()
            } else {
                padded.normal()
            };
            let size = if entry.is_dir {
                "--".to_string()
            } else {
                format_size(entry.size)
            };
            println!(
                "{}  {:>10}  {}",
                name,
                size.dimmed(),
                format_modified(&entry.modified).dimmed()
            );
        }

        println!("{}", "-".repeat(name_width + 30));
        println!("{}", status_line(summary));
        println!("{}", size_line(summary).dimmed());
    }

    /// Prints a table of file counts per category.
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!("{:<width$} | {}", "Category".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count, "file", "files")
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files, "file", "files")
        );
    }
}

/// Formats a byte count with a binary unit, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

/// Formats a timestamp in local time as `YYYY-MM-DD HH:MM`.
pub fn format_modified(modified: &DateTime<Utc>) -> String {
    modified
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// The listing status line, e.g. `5 items (2 folders, 3 files)`.
pub fn status_line(summary: &ListingSummary) -> String {
    format!(
        "{} {} ({} {}, {} {})",
        summary.total,
        plural(summary.total, "item", "items"),
        summary.directories,
        plural(summary.directories, "folder", "folders"),
        summary.files,
        plural(summary.files, "file", "files"),
    )
}

/// Total size of the files in a listing, e.g. `Total size: 1.5 KB`.
pub fn size_line(summary: &ListingSummary) -> String {
    format!("Total size: {}", format_size(summary.total_file_bytes))
}

fn display_name(entry: &FileEntry) -> String {
    if entry.is_dir {
        format!("{}/", entry.name)
    } else {
        entry.name.clone()
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
