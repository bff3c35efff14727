//! Extension-based file categorization.
//!
//! A [`CategoryTable`] is an ordered list of [`CategoryRule`]s, each mapping a
//! category name (which doubles as the destination subdirectory name) to a
//! set of lower-cased extensions. Classification only looks at the file name;
//! file contents are never read.
//!
//! # Examples
//!
//! ```
//! use dirsort::file_category::CategoryTable;
//!
//! let table = CategoryTable::default();
//! assert_eq!(table.classify("holiday.PNG"), "Images");
//! assert_eq!(table.classify("report.pdf"), "Documents");
//! assert_eq!(table.classify("README"), "Other");
//! ```

use std::collections::{BTreeSet, HashMap};

/// Category assigned to files whose extension matches no rule.
pub const OTHER_CATEGORY: &str = "Other";

const DEFAULT_RULES: &[(&str, &[&str])] = &[
    ("Images", &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp"]),
    (
        "Documents",
        &[
            ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx",
        ],
    ),
    ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
    ("Audio", &[".mp3", ".wav", ".ogg", ".flac", ".aac"]),
    ("Videos", &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv"]),
    (
        "Code",
        &[
            ".py", ".js", ".html", ".css", ".java", ".c", ".cpp", ".h", ".json", ".xml",
        ],
    ),
    ("Executables", &[".exe", ".msi", ".bat", ".sh"]),
];

/// A named category and the extensions that belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    name: String,
    extensions: BTreeSet<String>,
}

impl CategoryRule {
    /// Creates a rule, normalizing every extension to lower case with a
    /// leading dot (`"PNG"` and `".png"` both become `".png"`).
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .filter(|ext| ext.len() > 1)
                .collect(),
        }
    }

    /// The category name, also used as the subdirectory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized extensions of this rule.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Returns true if `ext` (already normalized) belongs to this rule.
    pub fn matches(&self, ext: &str) -> bool {
        self.extensions.contains(ext)
    }
}

/// Ordered extension-to-category lookup table.
///
/// When an extension is listed under more than one category, the category
/// declared first wins.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    index: HashMap<String, usize>,
}

impl CategoryTable {
    /// Builds a table from rules in precedence order.
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let mut index = HashMap::new();
        for (position, rule) in rules.iter().enumerate() {
            for ext in rule.extensions() {
                index.entry(ext.to_string()).or_insert(position);
            }
        }
        Self { rules, index }
    }

    /// Looks up the category for an extension such as `".png"` or `"PNG"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// assert_eq!(table.extension_to_category(".mp3"), Some("Audio"));
    /// assert_eq!(table.extension_to_category("ZIP"), Some("Archives"));
    /// assert_eq!(table.extension_to_category(".xyz123"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<&str> {
        self.index
            .get(&normalize_extension(ext))
            .map(|&position| self.rules[position].name())
    }

    /// Returns the category for a file name, or [`OTHER_CATEGORY`].
    ///
    /// Only the lower-cased extension is looked up. It is not trimmed, so
    /// `"photo.png "` has the extension `".png "` and is not an image.
    pub fn classify(&self, filename: &str) -> &str {
        let (_, ext) = split_extension(filename);
        if ext.is_empty() {
            return OTHER_CATEGORY;
        }
        self.index
            .get(&ext.to_lowercase())
            .map_or(OTHER_CATEGORY, |&position| self.rules[position].name())
    }

    /// Iterates over all category names, in precedence order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(CategoryRule::name)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_RULES
                .iter()
                .map(|(name, extensions)| CategoryRule::new(*name, extensions.iter()))
                .collect(),
        )
    }
}

/// Splits a file name into stem and extension.
///
/// The extension starts at the last `.` and keeps it. Leading dots are part
/// of the stem, so `.bashrc` has no extension.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::split_extension;
///
/// assert_eq!(split_extension("photo.png"), ("photo", ".png"));
/// assert_eq!(split_extension("backup.tar.gz"), ("backup.tar", ".gz"));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_extension("Makefile"), ("Makefile", ""));
/// ```
pub fn split_extension(filename: &str) -> (&str, &str) {
    let leading = filename.len() - filename.trim_start_matches('.').len();
    match filename[leading..].rfind('.') {
        Some(dot) => filename.split_at(leading + dot),
        None => (filename, ""),
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_images_case_insensitive() {
        let table = CategoryTable::default();
        for name in ["a.png", "b.jpg", "c.JPEG", "d.Gif", "e.webp", "f.SVG"] {
            assert_eq!(table.classify(name), "Images", "{}", name);
        }
    }

    #[test]
    fn test_classify_each_default_category() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("notes.txt"), "Documents");
        assert_eq!(table.classify("sheet.xlsx"), "Documents");
        assert_eq!(table.classify("bundle.7z"), "Archives");
        assert_eq!(table.classify("song.flac"), "Audio");
        assert_eq!(table.classify("clip.mkv"), "Videos");
        assert_eq!(table.classify("main.cpp"), "Code");
        assert_eq!(table.classify("install.sh"), "Executables");
    }

    #[test]
    fn test_classify_unknown_extension_is_other() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("data.xyz123"), OTHER_CATEGORY);
    }

    #[test]
    fn test_classify_without_extension_is_other() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("Makefile"), OTHER_CATEGORY);
        assert_eq!(table.classify(".gitignore"), OTHER_CATEGORY);
        assert_eq!(table.classify("trailing."), OTHER_CATEGORY);
        assert_eq!(table.classify(""), OTHER_CATEGORY);
    }

    #[test]
    fn test_classify_does_not_trim_extension() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("photo.png "), OTHER_CATEGORY);
        assert_eq!(table.classify("photo. png"), OTHER_CATEGORY);
        assert_eq!(table.classify(" photo.png"), "Images");
    }

    #[test]
    fn test_classify_uses_last_extension() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("backup.tar.gz"), "Archives");
        assert_eq!(table.classify("photo.png.txt"), "Documents");
    }

    #[test]
    fn test_first_declared_category_wins() {
        let table = CategoryTable::new(vec![
            CategoryRule::new("Web", [".html", ".css"]),
            CategoryRule::new("Code", [".html", ".rs"]),
        ]);
        assert_eq!(table.classify("index.html"), "Web");
        assert_eq!(table.classify("lib.rs"), "Code");
    }

    #[test]
    fn test_rule_normalizes_extensions() {
        let rule = CategoryRule::new("Images", ["PNG", ".Jpg", " gif ", "."]);
        let extensions: Vec<_> = rule.extensions().collect();
        assert_eq!(extensions, vec![".gif", ".jpg", ".png"]);
        assert!(rule.matches(".png"));
        assert!(!rule.matches("png"));
    }

    #[test]
    fn test_extension_to_category_accepts_bare_extension() {
        let table = CategoryTable::default();
        assert_eq!(table.extension_to_category("pdf"), Some("Documents"));
        assert_eq!(table.extension_to_category(".PDF"), Some("Documents"));
        assert_eq!(table.extension_to_category("unknown"), None);
    }

    #[test]
    fn test_default_category_order() {
        let table = CategoryTable::default();
        let names: Vec<_> = table.category_names().collect();
        assert_eq!(
            names,
            vec![
                "Images",
                "Documents",
                "Archives",
                "Audio",
                "Videos",
                "Code",
                "Executables"
            ]
        );
    }

    #[test]
    fn test_split_extension_edge_cases() {
        assert_eq!(split_extension("..hidden"), ("..hidden", ""));
        assert_eq!(split_extension(".config.toml"), (".config", ".toml"));
        assert_eq!(split_extension("file."), ("file", "."));
        assert_eq!(split_extension(""), ("", ""));
    }
}
