//! Size and complexity metrics collected from the working tree.
//!
//! Walks a repository respecting `.gitignore`, restricts to the configured
//! source extension, and computes per-file lines of code and aggregate
//! cyclomatic complexity from a tree-sitter parse.

use std::path::Path;

use strata_core::{FileKey, StrataError};
use tree_sitter::{Node, Parser};

use crate::hotspots::FileMetric;

/// Maximum file size to process (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

/// Number of bytes to check for binary detection.
const BINARY_CHECK_SIZE: usize = 8192;

/// Metrics for every measurable source file, plus per-file skip notices.
///
/// A file that cannot be read or parsed is skipped with a warning rather
/// than failing the whole collection.
#[derive(Debug, Clone, Default)]
pub struct CollectedMetrics {
    /// One entry per file that yielded metrics.
    pub files: Vec<FileMetric>,
    /// Human-readable notices for files that were found but skipped.
    pub warnings: Vec<String>,
}

/// Collect LOC and complexity metrics for source files under `root`.
///
/// Walks the tree with `.gitignore` semantics, keeping only files with the
/// given extension (without the dot) and skipping any file with a path
/// segment named in `excluded_dirs`. LOC counts non-blank lines that are
/// not `#`-comment-only; complexity is the aggregate over all function
/// blocks in the file (one per block, plus one per decision point).
/// Results are sorted by path.
///
/// # Errors
///
/// Returns [`StrataError::Parse`] if the grammar cannot be loaded, or
/// [`StrataError::Input`] when candidate files exist but every one of them
/// had to be skipped.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use strata_analytics::metrics::collect_metrics;
///
/// let collected = collect_metrics(Path::new("."), "py", &[]).unwrap();
/// for m in &collected.files {
///     println!("{}: {} loc, cc {}", m.file, m.loc, m.complexity);
/// }
/// ```
pub fn collect_metrics(
    root: &Path,
    extension: &str,
    excluded_dirs: &[String],
) -> Result<CollectedMetrics, StrataError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| StrataError::Parse(format!("failed to set language: {e}")))?;

    let walker = ignore::WalkBuilder::new(root).build();
    let mut collected = CollectedMetrics::default();
    let mut candidates = 0usize;

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(e) => e,
            None => continue,
        };
        if ext != extension {
            continue;
        }

        let key = FileKey::relative_to(root, path);
        if key
            .segments()
            .any(|segment| excluded_dirs.iter().any(|dir| dir == segment))
        {
            continue;
        }
        candidates += 1;

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                collected.warnings.push(format!("{key}: {e}"));
                continue;
            }
        };
        if metadata.len() > MAX_FILE_SIZE {
            collected.warnings.push(format!("{key}: file too large"));
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                collected.warnings.push(format!("{key}: {e}"));
                continue;
            }
        };

        // Null bytes in the head mean binary content.
        let check_len = content.len().min(BINARY_CHECK_SIZE);
        if content.as_bytes()[..check_len].contains(&0) {
            collected.warnings.push(format!("{key}: binary content"));
            continue;
        }

        let Some(tree) = parser.parse(&content, None) else {
            collected.warnings.push(format!("{key}: unparseable"));
            continue;
        };

        collected.files.push(FileMetric {
            file: key,
            loc: count_loc(&content),
            complexity: count_complexity(tree.root_node()),
        });
    }

    if candidates > 0 && collected.files.is_empty() {
        return Err(StrataError::Input(format!(
            "{candidates} candidate files found under {} but none yielded metrics",
            root.display()
        )));
    }

    collected.files.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(collected)
}

/// Count non-blank lines that are not `#`-comment-only.
fn count_loc(content: &str) -> u64 {
    content
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .count() as u64
}

/// Aggregate cyclomatic complexity over all function blocks in a parse tree.
///
/// Each function definition contributes a baseline of 1; every decision
/// point (branch, loop, exception handler, boolean operator, conditional
/// expression, match arm, comprehension filter) adds 1.
fn count_complexity(root: Node) -> u64 {
    let mut total = 0u64;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "function_definition" => total += 1,
            "if_statement"
            | "elif_clause"
            | "conditional_expression"
            | "for_statement"
            | "while_statement"
            | "except_clause"
            | "boolean_operator"
            | "case_clause"
            | "if_clause" => total += 1,
            _ => {}
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    total
}
