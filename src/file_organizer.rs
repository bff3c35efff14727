/// Moving files into category subdirectories.
///
/// [`Organizer`] classifies the regular files directly inside a directory and
/// moves each one into `<directory>/<category>/`. Subdirectories are never
/// entered. A file that cannot be moved is recorded in the
/// [`OrganizeReport`] and the run carries on with the next file.
///
/// The organizer holds no state between runs. Two runs against the same
/// directory must not overlap: free destination names are picked by probing
/// the filesystem, so concurrent runs can race for the same name.
use crate::config::FileFilter;
use crate::error::{FsResult, MoveError, MoveStage};
use crate::file_category::{CategoryTable, split_extension};
use crate::file_entry::ensure_directory;
use fs_extra::file::CopyOptions;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A file that was moved into its category directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedFile {
    /// Where the file was.
    pub source: PathBuf,
    /// Where it is now.
    pub destination: PathBuf,
    /// The category it was filed under.
    pub category: String,
}

/// A move that an organize run would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
}

/// Outcome of an organize run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Files moved, in processing order.
    pub moved: Vec<MovedFile>,
    /// Files that could not be moved.
    pub failures: Vec<MoveError>,
}

impl OrganizeReport {
    /// Number of files successfully moved.
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    /// Returns true if every candidate file was moved.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Progress notifications emitted by [`Organizer::organize_with_progress`].
#[derive(Debug)]
pub enum OrganizeEvent<'a> {
    /// Candidate files have been collected.
    Started { total: usize },
    /// One file was moved.
    Moved(&'a MovedFile),
    /// One file could not be moved.
    Failed(&'a MoveError),
}

/// Sorts the files of a directory into category subdirectories.
#[derive(Debug, Clone, Default)]
pub struct Organizer {
    table: CategoryTable,
    filter: FileFilter,
}

impl Organizer {
    /// Creates an organizer with the given category table and file filter.
    pub fn new(table: CategoryTable, filter: FileFilter) -> Self {
        Self { table, filter }
    }

    /// Returns the category name for `filename`.
    pub fn classify<'a>(&'a self, filename: &str) -> &'a str {
        self.table.classify(filename)
    }

    /// Organizes `dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::FilesystemError`] if `dir` is missing, not a
    /// directory, or unreadable. Failures on individual files are reported
    /// in the returned [`OrganizeReport`] instead.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::file_organizer::Organizer;
    /// use std::path::Path;
    ///
    /// let report = Organizer::default().organize(Path::new("/home/user/Downloads"))?;
    /// println!("moved {} files", report.moved_count());
    /// for failure in &report.failures {
    ///     eprintln!("{}", failure);
    /// }
    /// # Ok::<(), dirsort::FilesystemError>(())
    /// ```
    pub fn organize(&self, dir: &Path) -> FsResult<OrganizeReport> {
        self.organize_with_progress(dir, |_| {})
    }

    /// Organizes `dir`, calling `on_event` once before the first move and
    /// once per candidate file.
    pub fn organize_with_progress<F>(&self, dir: &Path, mut on_event: F) -> FsResult<OrganizeReport>
    where
        F: FnMut(OrganizeEvent<'_>),
    {
        let (dir, candidates) = self.collect_candidates(dir)?;
        on_event(OrganizeEvent::Started {
            total: candidates.len(),
        });

        let mut report = OrganizeReport::default();
        for (source, file_name) in candidates {
            let category = self.table.classify(&file_name.to_string_lossy()).to_string();
            match move_into_category(&dir, &source, &file_name, &category) {
                Ok(destination) => {
                    info!(
                        source = %source.display(),
                        destination = %destination.display(),
                        "moved file"
                    );
                    report.moved.push(MovedFile {
                        source,
                        destination,
                        category,
                    });
                    if let Some(moved) = report.moved.last() {
                        on_event(OrganizeEvent::Moved(moved));
                    }
                }
                Err(error) => {
                    warn!("{}", error);
                    report.failures.push(error);
                    if let Some(failed) = report.failures.last() {
                        on_event(OrganizeEvent::Failed(failed));
                    }
                }
            }
        }

        info!(
            dir = %dir.display(),
            moved = report.moved.len(),
            failed = report.failures.len(),
            "organize finished"
        );
        Ok(report)
    }

    /// Computes the moves [`Organizer::organize`] would make, without
    /// touching the filesystem.
    pub fn plan(&self, dir: &Path) -> FsResult<Vec<PlannedMove>> {
        let (dir, candidates) = self.collect_candidates(dir)?;
        let mut reserved: HashSet<PathBuf> = HashSet::new();

        Ok(candidates
            .into_iter()
            .map(|(source, file_name)| {
                let category = self.table.classify(&file_name.to_string_lossy()).to_string();
                let destination =
                    resolve_destination_with(&dir.join(&category), &file_name, |candidate| {
                        candidate.symlink_metadata().is_ok() || reserved.contains(candidate)
                    });
                reserved.insert(destination.clone());
                PlannedMove {
                    source,
                    destination,
                    category,
                }
            })
            .collect())
    }

    /// Collects the regular files in `dir` that pass the filter.
    ///
    /// File names are kept as the filesystem reports them. Only
    /// classification and filtering look at a lossy UTF-8 rendering.
    fn collect_candidates(&self, dir: &Path) -> FsResult<(PathBuf, Vec<(PathBuf, OsString)>)> {
        let dir = ensure_directory(dir)?;
        let entries = fs::read_dir(&dir).map_err(|e| crate::FilesystemError::Unreadable {
            path: dir.clone(),
            source: e,
        })?;

        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !fs::metadata(&path).is_ok_and(|m| m.is_file()) {
                continue;
            }

            let file_name = entry.file_name();
            if !self.filter.should_include(&file_name.to_string_lossy()) {
                debug!(file = %file_name.to_string_lossy(), "skipping filtered file");
                continue;
            }

            candidates.push((path, file_name));
        }

        Ok((dir, candidates))
    }
}

/// Returns the first free destination for `file_name` inside `category_dir`.
///
/// If `file_name` is taken, `_1`, `_2`, ... is inserted before the extension
/// until a name is free: `photo.png`, `photo_1.png`, `photo_2.png`.
pub fn resolve_destination(category_dir: &Path, file_name: impl AsRef<OsStr>) -> PathBuf {
    resolve_destination_with(category_dir, file_name.as_ref(), |candidate| {
        candidate.symlink_metadata().is_ok()
    })
}

fn resolve_destination_with<F>(category_dir: &Path, file_name: &OsStr, mut is_taken: F) -> PathBuf
where
    F: FnMut(&Path) -> bool,
{
    let mut destination = category_dir.join(file_name);
    let mut counter: u64 = 1;
    while is_taken(&destination) {
        destination = category_dir.join(numbered_name(file_name, counter));
        counter += 1;
    }
    destination
}

/// Inserts `_<counter>` before the extension of `file_name`.
fn numbered_name(file_name: &OsStr, counter: u64) -> OsString {
    if let Some(name) = file_name.to_str() {
        let (stem, ext) = split_extension(name);
        return OsString::from(format!("{}_{}{}", stem, counter, ext));
    }

    let (stem, ext) = split_os_extension(file_name);
    let mut numbered = stem.to_os_string();
    numbered.push(format!("_{}", counter));
    numbered.push(ext);
    numbered
}

/// Byte-level [`split_extension`] for names that are not valid UTF-8.
#[cfg(unix)]
fn split_os_extension(file_name: &OsStr) -> (&OsStr, &OsStr) {
    use std::os::unix::ffi::OsStrExt;

    let bytes = file_name.as_bytes();
    let leading = bytes.iter().take_while(|&&b| b == b'.').count();
    match bytes[leading..].iter().rposition(|&b| b == b'.') {
        Some(dot) => {
            let (stem, ext) = bytes.split_at(leading + dot);
            (OsStr::from_bytes(stem), OsStr::from_bytes(ext))
        }
        None => (file_name, OsStr::new("")),
    }
}

// The counter goes at the end of the name.
#[cfg(not(unix))]
fn split_os_extension(file_name: &OsStr) -> (&OsStr, &OsStr) {
    (file_name, OsStr::new(""))
}

fn move_into_category(
    base: &Path,
    source: &Path,
    file_name: &OsStr,
    category: &str,
) -> Result<PathBuf, MoveError> {
    let category_dir = base.join(category);
    fs::create_dir_all(&category_dir).map_err(|e| MoveError {
        source_path: source.to_path_buf(),
        destination: category_dir.clone(),
        stage: MoveStage::CreateCategoryDir,
        source: e,
    })?;

    let destination = resolve_destination(&category_dir, file_name);
    debug!(destination = %destination.display(), "resolved destination");

    move_file(source, &destination).map_err(|e| MoveError {
        source_path: source.to_path_buf(),
        destination: destination.clone(),
        stage: MoveStage::Relocate,
        source: e,
    })?;

    Ok(destination)
}

/// Renames `source` to `destination`, copying across filesystems when a
/// plain rename is not possible.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(source = %source.display(), "rename crosses devices, copying instead");
            copy_then_remove(source, destination)
        }
        result => result,
    }
}

/// Copies `source` to `destination` and removes `source`.
///
/// An existing `destination` is never overwritten. If the copy or the
/// removal fails, whatever was written to `destination` is deleted so the
/// name stays free.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    let existed = destination.symlink_metadata().is_ok();
    fs_extra::file::move_file(source, destination, &CopyOptions::new())
        .map(|_| ())
        .map_err(|error| {
            if !existed {
                let _ = fs::remove_file(destination);
            }
            into_io_error(error)
        })
}

fn into_io_error(error: fs_extra::error::Error) -> io::Error {
    match error.kind {
        fs_extra::error::ErrorKind::Io(source) => source,
        _ => io::Error::other(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryRule;
    use crate::FilesystemError;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str) {
        fs::write(dir.join(name), name).expect("Failed to write test file");
    }

    #[test]
    fn test_organize_moves_into_category_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "photo.png");
        write(base, "report.pdf");
        write(base, "mystery.xyz123");

        let report = Organizer::default().organize(base).expect("Organize failed");

        assert_eq!(report.moved_count(), 3);
        assert!(report.is_complete_success());
        assert!(base.join("Images/photo.png").is_file());
        assert!(base.join("Documents/report.pdf").is_file());
        assert!(base.join("Other/mystery.xyz123").is_file());
        assert!(!base.join("photo.png").exists());
    }

    #[test]
    fn test_organize_uses_existing_category_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("Images")).unwrap();
        write(&base.join("Images"), "old.jpg");
        write(base, "new.jpg");

        let report = Organizer::default().organize(base).expect("Organize failed");

        assert_eq!(report.moved_count(), 1);
        assert!(base.join("Images/old.jpg").is_file());
        assert!(base.join("Images/new.jpg").is_file());
    }

    #[test]
    fn test_organize_leaves_directories_and_hidden_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("projects.zip")).unwrap();
        write(&base.join("projects.zip"), "inner.png");
        write(base, ".env");

        let report = Organizer::default().organize(base).expect("Organize failed");

        assert_eq!(report.moved_count(), 0);
        assert!(base.join("projects.zip/inner.png").is_file());
        assert!(base.join(".env").is_file());
        assert!(!base.join("Other").exists());
    }

    #[test]
    fn test_organize_reports_source_and_category() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "song.mp3");

        let report = Organizer::default().organize(base).expect("Organize failed");
        let moved = &report.moved[0];

        assert_eq!(moved.category, "Audio");
        assert_eq!(moved.source.file_name().unwrap(), "song.mp3");
        assert!(moved.destination.ends_with("Audio/song.mp3"));
    }

    #[test]
    fn test_organize_invalid_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = Organizer::default().organize(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(FilesystemError::NotFound { .. })));

        write(temp_dir.path(), "file.txt");
        let result = Organizer::default().organize(&temp_dir.path().join("file.txt"));
        assert!(matches!(result, Err(FilesystemError::NotADirectory { .. })));
    }

    #[test]
    fn test_resolve_destination_appends_counter() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        assert_eq!(resolve_destination(dir, "photo.png"), dir.join("photo.png"));

        write(dir, "photo.png");
        assert_eq!(resolve_destination(dir, "photo.png"), dir.join("photo_1.png"));

        write(dir, "photo_1.png");
        assert_eq!(resolve_destination(dir, "photo.png"), dir.join("photo_2.png"));
    }

    #[test]
    fn test_resolve_destination_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        write(dir, "Makefile");
        assert_eq!(resolve_destination(dir, "Makefile"), dir.join("Makefile_1"));

        write(dir, "archive.tar.gz");
        assert_eq!(
            resolve_destination(dir, "archive.tar.gz"),
            dir.join("archive.tar_1.gz")
        );
    }

    #[test]
    fn test_category_dir_blocked_by_file_is_per_file_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "Locked");
        write(base, "a.lck");
        write(base, "b.txt");

        let table = CategoryTable::new(vec![
            CategoryRule::new("Locked", [".lck"]),
            CategoryRule::new("Text", [".txt"]),
        ]);
        let filter = crate::config::Config::from_toml(
            "[filters.exclude]\nfilenames = [\"Locked\"]\n",
        )
        .unwrap()
        .compile_filters()
        .unwrap();

        let report = Organizer::new(table, filter)
            .organize(base)
            .expect("Organize failed");

        assert_eq!(report.moved_count(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, MoveStage::CreateCategoryDir);
        assert!(base.join("a.lck").is_file());
        assert!(base.join("Text/b.txt").is_file());
    }

    #[test]
    fn test_progress_events() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "a.txt");
        write(base, "b.png");

        let mut started = None;
        let mut moved = 0;
        Organizer::default()
            .organize_with_progress(base, |event| match event {
                OrganizeEvent::Started { total } => started = Some(total),
                OrganizeEvent::Moved(_) => moved += 1,
                OrganizeEvent::Failed(_) => panic!("unexpected failure"),
            })
            .expect("Organize failed");

        assert_eq!(started, Some(2));
        assert_eq!(moved, 2);
    }

    #[test]
    fn test_plan_does_not_move_and_reserves_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("Images")).unwrap();
        write(&base.join("Images"), "photo.png");
        write(base, "photo.png");
        write(base, "photo_1.png");

        let plan = Organizer::default().plan(base).expect("Plan failed");

        assert_eq!(plan.len(), 2);
        assert!(base.join("photo.png").is_file());
        let destinations: Vec<_> = plan
            .iter()
            .map(|p| p.destination.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_ne!(destinations[0], destinations[1]);
        assert!(plan.iter().all(|p| p.category == "Images"));
        assert!(!destinations.contains(&"photo.png".to_string()));
    }

    #[test]
    fn test_vanished_source_is_relocate_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        for name in ["a.txt", "b.txt", "c.txt"] {
            write(base, name);
        }

        let vanishing = base.join("b.txt");
        let mut failed_events = 0;
        let report = Organizer::default()
            .organize_with_progress(base, |event| match event {
                OrganizeEvent::Started { .. } => {
                    fs::remove_file(&vanishing).expect("Failed to remove test file");
                }
                OrganizeEvent::Failed(_) => failed_events += 1,
                OrganizeEvent::Moved(_) => {}
            })
            .expect("Organize failed");

        assert_eq!(report.moved_count(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(failed_events, 1);

        let failure = &report.failures[0];
        assert_eq!(failure.stage, MoveStage::Relocate);
        assert!(failure.source_path.ends_with("b.txt"));
        assert_eq!(failure.source.kind(), io::ErrorKind::NotFound);
        assert!(base.join("Documents/a.txt").is_file());
        assert!(base.join("Documents/c.txt").is_file());
        assert!(!base.join("Documents/b.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_organize_keeps_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let latin1 = OsStr::from_bytes(b"caf\xe9.png");
        let invalid = OsStr::from_bytes(b"caf\xff.png");
        if fs::write(base.join(latin1), "a").is_err() {
            // Filesystem rejects non-UTF-8 names.
            return;
        }
        fs::write(base.join(invalid), "b").expect("Failed to write test file");

        let report = Organizer::default().organize(base).expect("Organize failed");

        assert_eq!(report.moved_count(), 2);
        assert!(report.moved.iter().all(|m| m.category == "Images"));
        assert_eq!(fs::read_to_string(base.join("Images").join(latin1)).unwrap(), "a");
        assert_eq!(fs::read_to_string(base.join("Images").join(invalid)).unwrap(), "b");
        assert_eq!(fs::read_dir(base.join("Images")).unwrap().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_destination_numbers_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let name = OsStr::from_bytes(b"caf\xe9.tar.gz");
        if fs::write(dir.join(name), "x").is_err() {
            return;
        }

        assert_eq!(
            resolve_destination(dir, name),
            dir.join(OsStr::from_bytes(b"caf\xe9.tar_1.gz"))
        );
        assert_eq!(
            numbered_name(OsStr::from_bytes(b".\xff"), 2),
            OsStr::from_bytes(b".\xff_2")
        );
    }

    #[test]
    fn test_copy_then_remove_moves_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("from.txt");
        let destination = temp_dir.path().join("to.txt");
        fs::write(&source, "content").unwrap();

        copy_then_remove(&source, &destination).expect("Copy failed");

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "content");
    }

    #[test]
    fn test_copy_then_remove_never_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("from.txt");
        let destination = temp_dir.path().join("to.txt");
        fs::write(&source, "new").unwrap();
        fs::write(&destination, "old").unwrap();

        assert!(copy_then_remove(&source, &destination).is_err());

        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
        assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
    }

    #[test]
    fn test_copy_then_remove_failure_leaves_name_free() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("from.txt");
        let destination = temp_dir.path().join("missing/to.txt");
        fs::write(&source, "content").unwrap();

        assert!(copy_then_remove(&source, &destination).is_err());

        assert!(source.is_file());
        assert!(destination.symlink_metadata().is_err());
    }

    #[test]
    fn test_move_file_renames() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("from.txt");
        let destination = temp_dir.path().join("to.txt");
        fs::write(&source, "content").unwrap();

        move_file(&source, &destination).expect("Move failed");

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "content");
    }
}
