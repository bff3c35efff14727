//! Error types shared by the listing and organizing operations.

use std::path::PathBuf;

/// The target directory of a top-level operation could not be used.
///
/// Returned by listing, planning and organizing when the directory itself is
/// missing, is not a directory, or cannot be enumerated. Nothing is moved
/// when this error is returned.
#[derive(Debug, thiserror::Error)]
pub enum FilesystemError {
    /// The path does not exist.
    #[error("Directory not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The path exists but is not a directory.
    #[error("Not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    /// The directory exists but could not be read.
    #[error("Failed to read directory {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What step of a single file's relocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStage {
    /// Creating the category subdirectory.
    CreateCategoryDir,
    /// Renaming or copying the file into place.
    Relocate,
}

/// A single file could not be relocated.
///
/// Recorded in the organize report; never aborts the batch.
#[derive(Debug, thiserror::Error)]
#[error("Failed to move {} to {}: {source}", .source_path.display(), .destination.display())]
pub struct MoveError {
    /// The file that was being moved.
    pub source_path: PathBuf,
    /// Where it was headed.
    pub destination: PathBuf,
    /// Which step failed.
    pub stage: MoveStage,
    #[source]
    pub source: std::io::Error,
}

/// Result type for operations on a whole directory.
pub type FsResult<T> = Result<T, FilesystemError>;
