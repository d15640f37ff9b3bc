//! Complexity/size hotspot detection.
//!
//! Flags files that are disproportionately complex or large relative to the
//! rest of the corpus, by percentile threshold.

use serde::{Deserialize, Serialize};
use strata_core::FileKey;

/// Externally computed size and complexity metrics for one file.
///
/// # Examples
///
/// ```
/// use strata_core::FileKey;
/// use strata_analytics::hotspots::FileMetric;
///
/// let metric = FileMetric {
///     file: FileKey::new("src/engine.py"),
///     loc: 1200,
///     complexity: 85,
/// };
/// assert_eq!(metric.loc, 1200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetric {
    /// Repository-relative path.
    pub file: FileKey,
    /// Lines of code.
    pub loc: u64,
    /// Aggregate cyclomatic complexity over all code blocks in the file.
    pub complexity: u64,
}

/// Hotspot classification result.
///
/// Thresholds are `None` when the input was empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotReport {
    /// Complexity threshold at the configured percentile.
    pub complexity_threshold: Option<f64>,
    /// LOC threshold at the configured percentile.
    pub loc_threshold: Option<f64>,
    /// Files at or above either threshold, sorted by complexity descending.
    pub hotspots: Vec<FileMetric>,
}

/// Percentile of `values` by linear interpolation between order statistics.
///
/// With `q` in `[0, 1]`, the result sits at fractional rank `q * (n - 1)`
/// of the sorted values, interpolating linearly between the two nearest
/// order statistics (the method pandas calls `linear`). Returns `None` for
/// an empty slice or `q` outside `[0, 1]`.
///
/// # Examples
///
/// ```
/// use strata_analytics::hotspots::percentile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0];
/// assert_eq!(percentile(&values, 0.5), Some(2.5));
/// assert_eq!(percentile(&values, 1.0), Some(4.0));
/// assert_eq!(percentile(&[], 0.5), None);
/// ```
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = rank - lower as f64;
    Some(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

/// Classify hotspots at the given percentile.
///
/// A file is a hotspot iff its complexity is at or above the complexity
/// threshold OR its size is at or above the LOC threshold; a large but
/// simple file still qualifies. The thresholds are computed independently
/// per metric. Output is sorted by complexity descending, ties by LOC then
/// path for determinism.
///
/// Raising the percentile can only shrink the hotspot set, never grow it.
///
/// # Examples
///
/// ```
/// use strata_core::FileKey;
/// use strata_analytics::hotspots::{detect_hotspots, FileMetric};
///
/// let metrics: Vec<FileMetric> = (0..9u64)
///     .map(|i| FileMetric { file: FileKey::new(&format!("f{i}.py")), loc: 10 + i, complexity: 1 })
///     .chain(std::iter::once(FileMetric {
///         file: FileKey::new("big.py"),
///         loc: 50,
///         complexity: 100,
///     }))
///     .collect();
/// let report = detect_hotspots(&metrics, 0.90);
/// assert_eq!(report.hotspots.len(), 1);
/// assert_eq!(report.hotspots[0].file.as_str(), "big.py");
/// ```
pub fn detect_hotspots(metrics: &[FileMetric], quantile: f64) -> HotspotReport {
    let complexity_values: Vec<f64> = metrics.iter().map(|m| m.complexity as f64).collect();
    let loc_values: Vec<f64> = metrics.iter().map(|m| m.loc as f64).collect();

    let complexity_threshold = percentile(&complexity_values, quantile);
    let loc_threshold = percentile(&loc_values, quantile);

    let mut hotspots: Vec<FileMetric> = match (complexity_threshold, loc_threshold) {
        (Some(cc_thr), Some(loc_thr)) => metrics
            .iter()
            .filter(|m| m.complexity as f64 >= cc_thr || m.loc as f64 >= loc_thr)
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    hotspots.sort_by(|a, b| {
        b.complexity
            .cmp(&a.complexity)
            .then_with(|| b.loc.cmp(&a.loc))
            .then_with(|| a.file.cmp(&b.file))
    });

    HotspotReport {
        complexity_threshold,
        loc_threshold,
        hotspots,
    }
}
