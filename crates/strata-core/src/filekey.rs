use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A normalized repository-relative path, used as the join key across all
/// analyses.
///
/// Normalization rewrites backslashes to forward slashes and strips leading
/// `./` and `/` segments, so keys produced from different sources (git
/// deltas, directory walks, metric tables) compare equal when they name the
/// same file. Two records with different absolute roots but the same
/// relative path normalize to equal keys via [`FileKey::relative_to`].
///
/// # Examples
///
/// ```
/// use strata_core::FileKey;
///
/// let a = FileKey::new("./src\\pkg\\mod.py");
/// let b = FileKey::new("src/pkg/mod.py");
/// assert_eq!(a, b);
/// assert_eq!(a.file_name(), "mod.py");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileKey(String);

impl FileKey {
    /// Create a key from a raw path string, normalizing separators and
    /// leading `./` / `/`.
    pub fn new(raw: &str) -> Self {
        let mut s = raw.replace('\\', "/");
        loop {
            if let Some(rest) = s.strip_prefix("./") {
                s = rest.to_string();
            } else if let Some(rest) = s.strip_prefix('/') {
                s = rest.to_string();
            } else {
                break;
            }
        }
        FileKey(s)
    }

    /// Create a key for `path` relative to `root`.
    ///
    /// Falls back to normalizing `path` as-is when it is not under `root`,
    /// so already-relative paths pass through unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use strata_core::FileKey;
    ///
    /// let key = FileKey::relative_to(Path::new("/repo"), Path::new("/repo/src/a.py"));
    /// assert_eq!(key.as_str(), "src/a.py");
    /// ```
    pub fn relative_to(root: &Path, path: &Path) -> Self {
        let rel = path.strip_prefix(root).unwrap_or(path);
        FileKey::new(&rel.to_string_lossy())
    }

    /// The normalized path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, split on `/`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// The final path segment (the filename).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Whether the filename has the given extension (without the dot).
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::FileKey;
    ///
    /// assert!(FileKey::new("src/a.py").has_extension("py"));
    /// assert!(!FileKey::new("src/a.pyc").has_extension("py"));
    /// assert!(!FileKey::new("src/py").has_extension("py"));
    /// ```
    pub fn has_extension(&self, ext: &str) -> bool {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, e)) => !stem.is_empty() && e == ext,
            None => false,
        }
    }

    /// Whether the filename starts with the given test prefix
    /// (e.g. `test_`), the conventional marker for test files.
    pub fn is_test_file(&self, prefix: &str) -> bool {
        self.file_name().starts_with(prefix)
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileKey {
    fn from(raw: &str) -> Self {
        FileKey::new(raw)
    }
}
