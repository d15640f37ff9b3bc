//! Module-name to test-file resolution.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use strata_core::{FileKey, LayoutConfig, StrataError};

use crate::imports::extract_imports;
use crate::mirror::module_name;

/// An inverted index from qualified module names to the test files that
/// import them.
///
/// Read-only after construction. Per-file parse failures are recorded in
/// `warnings` and never fail the build; an unparsable test file simply
/// contributes no entries.
///
/// # Examples
///
/// ```
/// use strata_core::FileKey;
/// use strata_trace::resolver::ImportIndex;
///
/// let files = vec![(
///     FileKey::new("tests/test_mod.py"),
///     "from pkg.mod import Thing\n".to_string(),
/// )];
/// let index = ImportIndex::build(&files);
/// assert_eq!(index.lookup("pkg.mod"), vec![FileKey::new("tests/test_mod.py")]);
/// assert!(index.lookup("pkg.other").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImportIndex {
    by_name: HashMap<String, BTreeSet<FileKey>>,
    /// Notices for test files that could not be parsed.
    pub warnings: Vec<String>,
}

impl ImportIndex {
    /// Build an index from `(test file, source text)` pairs.
    ///
    /// Entries from all files are unioned, so building from shards and
    /// combining would give the same index.
    pub fn build(files: &[(FileKey, String)]) -> Self {
        let mut index = ImportIndex::default();
        for (file, source) in files {
            match extract_imports(source) {
                Ok(imports) => {
                    for import in imports {
                        for name in import.qualified_names() {
                            index.by_name.entry(name).or_default().insert(file.clone());
                        }
                    }
                }
                Err(e) => index.warnings.push(format!("{file}: {e}")),
            }
        }
        index
    }

    /// Build an index from the test files on disk under `root/test_root`.
    ///
    /// Walks with `.gitignore` semantics and keeps `.py` files. Keys are
    /// relative to `root`. Unreadable files are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Input`] when the test directory does not
    /// exist.
    pub fn build_from_dir(root: &Path, test_root: &str) -> Result<Self, StrataError> {
        let test_dir = root.join(test_root);
        if !test_dir.is_dir() {
            return Err(StrataError::Input(format!(
                "test directory {} not found",
                test_dir.display()
            )));
        }

        let mut files = Vec::new();
        let mut warnings = Vec::new();
        for entry in ignore::WalkBuilder::new(&test_dir).build() {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }
            let key = FileKey::relative_to(root, path);
            match std::fs::read_to_string(path) {
                Ok(source) => files.push((key, source)),
                Err(e) => warnings.push(format!("{key}: {e}")),
            }
        }

        let mut index = Self::build(&files);
        index.warnings.extend(warnings);
        Ok(index)
    }

    /// Test files importing `module`, best candidates first.
    ///
    /// Tries an exact name match first; failing that, falls back to strict
    /// dot-prefix matches (an importer of `pkg.mod.inner` also covers
    /// `pkg.mod`). Candidates are ordered by fewest path segments, then
    /// lexicographically. An empty result is a miss, not an error.
    pub fn lookup(&self, module: &str) -> Vec<FileKey> {
        let candidates: BTreeSet<FileKey> = match self.by_name.get(module) {
            Some(files) => files.clone(),
            None => {
                let prefix = format!("{module}.");
                self.by_name
                    .iter()
                    .filter(|(name, _)| name.starts_with(&prefix))
                    .flat_map(|(_, files)| files.iter().cloned())
                    .collect()
            }
        };

        let mut ordered: Vec<FileKey> = candidates.into_iter().collect();
        ordered.sort_by(|a, b| {
            a.segments()
                .count()
                .cmp(&b.segments().count())
                .then_with(|| a.cmp(b))
        });
        ordered
    }

    /// Number of distinct qualified names indexed.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Resolve the test file covering a source file.
///
/// Computes the dotted module name from the layout and returns the best
/// candidate from the index, or `None` when no test imports the module.
///
/// # Errors
///
/// Returns [`StrataError::Layout`] when `src` is not under the configured
/// source root.
///
/// # Examples
///
/// ```
/// use strata_core::{FileKey, LayoutConfig};
/// use strata_trace::resolver::{resolve_test_file, ImportIndex};
///
/// let files = vec![(
///     FileKey::new("tests/test_mod.py"),
///     "from pkg.mod import Thing\n".to_string(),
/// )];
/// let index = ImportIndex::build(&files);
/// let layout = LayoutConfig::default();
///
/// let resolved = resolve_test_file(&FileKey::new("src/pkg/mod.py"), &index, &layout).unwrap();
/// assert_eq!(resolved, Some(FileKey::new("tests/test_mod.py")));
/// ```
pub fn resolve_test_file(
    src: &FileKey,
    index: &ImportIndex,
    layout: &LayoutConfig,
) -> Result<Option<FileKey>, StrataError> {
    let module = module_name(src, layout)?;
    Ok(index.lookup(&module).into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_index(files: Vec<(&str, &str)>) -> ImportIndex {
        let files: Vec<(FileKey, String)> = files
            .into_iter()
            .map(|(path, source)| (FileKey::new(path), source.to_string()))
            .collect();
        ImportIndex::build(&files)
    }

    #[test]
    fn from_import_registers_module_and_symbol() {
        let index = make_index(vec![(
            "tests/test_mod.py",
            "from pkg.mod import Thing\n",
        )]);
        assert_eq!(
            index.lookup("pkg.mod"),
            vec![FileKey::new("tests/test_mod.py")]
        );
        assert_eq!(
            index.lookup("pkg.mod.Thing"),
            vec![FileKey::new("tests/test_mod.py")]
        );
    }

    #[test]
    fn lookup_miss_is_empty_not_an_error() {
        let index = make_index(vec![("tests/test_mod.py", "import os\n")]);
        assert!(index.lookup("pkg.unrelated").is_empty());
    }

    #[test]
    fn dot_prefix_fallback_requires_a_full_segment() {
        let index = make_index(vec![(
            "tests/test_inner.py",
            "import pkg.mod.inner\n",
        )]);
        // No exact entry for pkg.mod, but pkg.mod.inner matches the prefix.
        assert_eq!(
            index.lookup("pkg.mod"),
            vec![FileKey::new("tests/test_inner.py")]
        );
        // pkg.mo is not a segment boundary of pkg.mod.inner.
        assert!(index.lookup("pkg.mo").is_empty());
    }

    #[test]
    fn candidates_ordered_by_depth_then_path() {
        let index = make_index(vec![
            ("tests/deep/nested/test_b.py", "import pkg.mod\n"),
            ("tests/test_z.py", "import pkg.mod\n"),
            ("tests/test_a.py", "import pkg.mod\n"),
        ]);
        assert_eq!(
            index.lookup("pkg.mod"),
            vec![
                FileKey::new("tests/test_a.py"),
                FileKey::new("tests/test_z.py"),
                FileKey::new("tests/deep/nested/test_b.py"),
            ]
        );
    }

    #[test]
    fn resolve_follows_layout_and_index() {
        let index = make_index(vec![(
            "tests/test_mod.py",
            "from pkg.mod import Thing\n",
        )]);
        let layout = LayoutConfig::default();

        let resolved =
            resolve_test_file(&FileKey::new("src/pkg/mod.py"), &index, &layout).unwrap();
        assert_eq!(resolved, Some(FileKey::new("tests/test_mod.py")));

        let missed =
            resolve_test_file(&FileKey::new("src/pkg/other.py"), &index, &layout).unwrap();
        assert_eq!(missed, None);

        let err = resolve_test_file(&FileKey::new("docs/pkg/mod.py"), &index, &layout);
        assert!(err.is_err());
    }

    #[test]
    fn build_unions_entries_across_files() {
        let index = make_index(vec![
            ("tests/test_a.py", "import pkg.mod\n"),
            ("tests/test_b.py", "from pkg.mod import helper\n"),
        ]);
        assert_eq!(index.lookup("pkg.mod").len(), 2);

        // Same result as building from shards and unioning by hand.
        let shard_a = make_index(vec![("tests/test_a.py", "import pkg.mod\n")]);
        let shard_b = make_index(vec![("tests/test_b.py", "from pkg.mod import helper\n")]);
        let merged: BTreeSet<FileKey> = shard_a
            .lookup("pkg.mod")
            .into_iter()
            .chain(shard_b.lookup("pkg.mod"))
            .collect();
        let combined: BTreeSet<FileKey> = index.lookup("pkg.mod").into_iter().collect();
        assert_eq!(merged, combined);
    }

    #[test]
    fn build_from_dir_walks_test_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("tests")).unwrap();
        std::fs::write(
            root.join("tests/test_mod.py"),
            "from pkg.mod import Thing\n",
        )
        .unwrap();
        std::fs::write(root.join("tests/conftest.txt"), "not python\n").unwrap();

        let index = ImportIndex::build_from_dir(root, "tests").unwrap();
        assert_eq!(
            index.lookup("pkg.mod"),
            vec![FileKey::new("tests/test_mod.py")]
        );
        assert!(index.warnings.is_empty());
    }

    #[test]
    fn build_from_dir_requires_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImportIndex::build_from_dir(dir.path(), "tests").unwrap_err();
        assert!(matches!(err, StrataError::Input(_)));
    }
}
