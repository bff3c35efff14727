//! dirsort - directory listing and extension-based file organization
//!
//! The library lists directory entries, sorts them, classifies files by
//! extension, and moves files into category subdirectories while resolving
//! name collisions. The `dirsort` binary is a thin command-line layer over it.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_entry;
pub mod file_organizer;
pub mod output;

pub use config::{Config, ConfigError, FileFilter};
pub use error::{FilesystemError, MoveError, MoveStage};
pub use file_category::{CategoryRule, CategoryTable, OTHER_CATEGORY};
pub use file_entry::{FileEntry, ListingSummary, SortKey, list_directory, sort_entries, summarize};
pub use file_organizer::{MovedFile, OrganizeReport, Organizer, PlannedMove};
