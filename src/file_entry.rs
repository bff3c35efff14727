//! Directory listing and sorting.
//!
//! [`list_directory`] reads the direct children of a directory into
//! [`FileEntry`] values and [`sort_entries`] orders them by a [`SortKey`].
//! Entries are rebuilt on every listing; nothing is cached.

use crate::error::{FilesystemError, FsResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// One item observed in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// The file name, without any directory component.
    pub name: String,
    /// Absolute path to the item.
    pub path: PathBuf,
    /// Size in bytes as reported by the filesystem.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Whether the item is a directory.
    pub is_dir: bool,
}

/// Ordering applied to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    /// Name, A to Z. Directories first.
    #[default]
    NameAsc,
    /// Name, Z to A. Directories first.
    NameDesc,
    /// Oldest first.
    ModifiedAsc,
    /// Newest first.
    ModifiedDesc,
    /// Smallest first.
    SizeAsc,
    /// Largest first.
    SizeDesc,
}

impl SortKey {
    /// Returns true for the keys that group directories before files.
    pub fn groups_directories(self) -> bool {
        matches!(self, SortKey::NameAsc | SortKey::NameDesc)
    }
}

/// Counts shown alongside a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListingSummary {
    pub total: usize,
    pub directories: usize,
    pub files: usize,
    /// Sum of the sizes of the non-directory entries.
    pub total_file_bytes: u64,
}

/// Lists the direct children of `dir`.
///
/// Children that cannot be stat'd (dangling symlinks, permission problems,
/// entries removed while listing) are left out of the result. Symlinks are
/// followed, so a link to a directory is reported as a directory.
///
/// # Errors
///
/// Returns a [`FilesystemError`] if `dir` does not exist, is not a directory,
/// or cannot be read.
pub fn list_directory(dir: &Path) -> FsResult<Vec<FileEntry>> {
    let dir = ensure_directory(dir)?;
    let entries = fs::read_dir(&dir).map_err(|e| FilesystemError::Unreadable {
        path: dir.clone(),
        source: e,
    })?;

    let mut listing = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        match fs::metadata(&path) {
            Ok(metadata) => listing.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                modified: metadata
                    .modified()
                    .unwrap_or(SystemTime::UNIX_EPOCH)
                    .into(),
                size: metadata.len(),
                is_dir: metadata.is_dir(),
                path,
            }),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping entry that cannot be stat'd");
            }
        }
    }

    Ok(listing)
}

/// Returns `entries` ordered by `key`.
///
/// Sorting is stable: entries that compare equal keep their relative order.
/// Names compare case-insensitively. For the name keys, directories are then
/// moved ahead of files without disturbing the order inside either group.
pub fn sort_entries(mut entries: Vec<FileEntry>, key: SortKey) -> Vec<FileEntry> {
    match key {
        SortKey::NameAsc => entries.sort_by_cached_key(|e| e.name.to_lowercase()),
        SortKey::NameDesc => {
            entries.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()))
        }
        SortKey::ModifiedAsc => entries.sort_by_key(|e| e.modified),
        SortKey::ModifiedDesc => entries.sort_by(|a, b| b.modified.cmp(&a.modified)),
        SortKey::SizeAsc => entries.sort_by_key(|e| e.size),
        SortKey::SizeDesc => entries.sort_by(|a, b| b.size.cmp(&a.size)),
    }

    if key.groups_directories() {
        entries.sort_by_key(|e| !e.is_dir);
    }

    entries
}

/// Tallies directories, files and total file size of a listing.
pub fn summarize(entries: &[FileEntry]) -> ListingSummary {
    entries
        .iter()
        .fold(ListingSummary::default(), |mut summary, entry| {
            summary.total += 1;
            if entry.is_dir {
                summary.directories += 1;
            } else {
                summary.files += 1;
                summary.total_file_bytes += entry.size;
            }
            summary
        })
}

/// Checks that `dir` is an existing directory and returns it as an absolute
/// path (symlinks are not resolved).
pub(crate) fn ensure_directory(dir: &Path) -> FsResult<PathBuf> {
    let metadata = fs::metadata(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FilesystemError::NotFound {
            path: dir.to_path_buf(),
        },
        _ => FilesystemError::Unreadable {
            path: dir.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(FilesystemError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    std::path::absolute(dir).map_err(|e| FilesystemError::Unreadable {
        path: dir.to_path_buf(),
        source: e,
    })
}
