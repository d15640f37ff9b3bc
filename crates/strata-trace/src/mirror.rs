//! Structural mirroring between source and test trees.
//!
//! Pure path transforms over [`FileKey`]; no filesystem access.

use strata_core::{FileKey, LayoutConfig, StrataError};

/// Compute the conventional test path mirroring a source file.
///
/// `src/a/b/name.py` maps to `tests/a/b/test_name.py` under the default
/// layout; intermediate directories are preserved and only the filename
/// gains the test prefix.
///
/// # Errors
///
/// Returns [`StrataError::Layout`] when `src` does not start with the
/// configured source root or has no filename segment.
///
/// # Examples
///
/// ```
/// use strata_core::{FileKey, LayoutConfig};
/// use strata_trace::mirror::mirror_test_path;
///
/// let layout = LayoutConfig::default();
/// let mirrored = mirror_test_path(&FileKey::new("src/pkg/mod.py"), &layout).unwrap();
/// assert_eq!(mirrored.as_str(), "tests/pkg/test_mod.py");
///
/// assert!(mirror_test_path(&FileKey::new("docs/readme.py"), &layout).is_err());
/// ```
pub fn mirror_test_path(src: &FileKey, layout: &LayoutConfig) -> Result<FileKey, StrataError> {
    let inner = strip_source_root(src, layout)?;

    let mut parts: Vec<&str> = vec![layout.test_root.as_str()];
    let last = inner.len() - 1;
    parts.extend_from_slice(&inner[..last]);
    let test_name = format!("{}{}", layout.test_prefix, inner[last]);
    parts.push(&test_name);

    Ok(FileKey::new(&parts.join("/")))
}

/// Compute the dotted module name of a source file.
///
/// Drops the source root and the extension, joining the remaining segments
/// with dots: `src/pkg/mod.py` becomes `pkg.mod`.
///
/// # Errors
///
/// Returns [`StrataError::Layout`] when `src` does not start with the
/// configured source root or has no filename segment.
///
/// # Examples
///
/// ```
/// use strata_core::{FileKey, LayoutConfig};
/// use strata_trace::mirror::module_name;
///
/// let layout = LayoutConfig::default();
/// let name = module_name(&FileKey::new("src/pkg/mod.py"), &layout).unwrap();
/// assert_eq!(name, "pkg.mod");
/// ```
pub fn module_name(src: &FileKey, layout: &LayoutConfig) -> Result<String, StrataError> {
    let mut inner = strip_source_root(src, layout)?;

    let last = inner.len() - 1;
    let stem = match inner[last].rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => inner[last],
    };
    inner[last] = stem;

    Ok(inner.join("."))
}

/// Segments of `src` below the source root, at least one (the filename).
fn strip_source_root<'a>(
    src: &'a FileKey,
    layout: &LayoutConfig,
) -> Result<Vec<&'a str>, StrataError> {
    let segments: Vec<&str> = src.segments().collect();
    match segments.split_first() {
        Some((root, rest)) if *root == layout.source_root && !rest.is_empty() => {
            Ok(rest.to_vec())
        }
        _ => Err(StrataError::Layout(format!(
            "{src} is not under source root {:?}",
            layout.source_root
        ))),
    }
}
