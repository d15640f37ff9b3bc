//! Linear correlation between metrics and defect counts.
//!
//! Correlation on degenerate input (fewer than two points, or a series with
//! zero variance) is reported as an explicit `None`, never a NaN that
//! propagates silently.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strata_core::FileKey;

use crate::hotspots::{percentile, FileMetric};

/// Pearson correlation coefficient of two equal-length series.
///
/// Returns `None` when the series lengths differ, fewer than two points
/// are given, or either series has zero variance.
///
/// # Examples
///
/// ```
/// use strata_analytics::correlation::pearson;
///
/// let xs = [1.0, 2.0, 3.0];
/// let ys = [2.0, 4.0, 6.0];
/// let r = pearson(&xs, &ys).unwrap();
/// assert!((r - 1.0).abs() < 1e-12);
///
/// assert_eq!(pearson(&[1.0, 1.0], &[2.0, 3.0]), None); // zero variance
/// assert_eq!(pearson(&[], &[]), None);
/// ```
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Correlation between file size and complexity across the corpus.
pub fn loc_complexity_correlation(metrics: &[FileMetric]) -> Option<f64> {
    let locs: Vec<f64> = metrics.iter().map(|m| m.loc as f64).collect();
    let complexities: Vec<f64> = metrics.iter().map(|m| m.complexity as f64).collect();
    pearson(&locs, &complexities)
}

/// How defect counts relate to complexity and size.
///
/// Every field is `None` when the underlying statistic is undefined for
/// the given input.
///
/// # Examples
///
/// ```
/// use strata_analytics::correlation::DefectCorrelation;
///
/// let undefined = DefectCorrelation::default();
/// assert!(undefined.complexity_defects.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectCorrelation {
    /// Pearson correlation of complexity vs per-file defect count.
    pub complexity_defects: Option<f64>,
    /// Pearson correlation of LOC vs per-file defect count.
    pub loc_defects: Option<f64>,
    /// Mean defect count among files in the top complexity decile.
    pub mean_defects_top_decile: Option<f64>,
    /// Mean defect count among the remaining files.
    pub mean_defects_rest: Option<f64>,
}

/// Correlate complexity and size against per-file defect counts.
///
/// Metrics are joined with the defect table by [`FileKey`]; files absent
/// from the table join with a defect count of zero. The decile split uses
/// the complexity value at `quantile` (inclusive above).
pub fn correlate_defects(
    metrics: &[FileMetric],
    defects: &HashMap<FileKey, u32>,
    quantile: f64,
) -> DefectCorrelation {
    if metrics.is_empty() {
        return DefectCorrelation::default();
    }

    let complexities: Vec<f64> = metrics.iter().map(|m| m.complexity as f64).collect();
    let locs: Vec<f64> = metrics.iter().map(|m| m.loc as f64).collect();
    let defect_counts: Vec<f64> = metrics
        .iter()
        .map(|m| f64::from(defects.get(&m.file).copied().unwrap_or(0)))
        .collect();

    let (mean_top, mean_rest) = match percentile(&complexities, quantile) {
        Some(threshold) => {
            let mut top = Vec::new();
            let mut rest = Vec::new();
            for (complexity, defect_count) in complexities.iter().zip(&defect_counts) {
                if *complexity >= threshold {
                    top.push(*defect_count);
                } else {
                    rest.push(*defect_count);
                }
            }
            (mean(&top), mean(&rest))
        }
        None => (None, None),
    };

    DefectCorrelation {
        complexity_defects: pearson(&complexities, &defect_counts),
        loc_defects: pearson(&locs, &defect_counts),
        mean_defects_top_decile: mean_top,
        mean_defects_rest: mean_rest,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(path: &str, loc: u64, complexity: u64) -> FileMetric {
        FileMetric {
            file: FileKey::new(path),
            loc,
            complexity,
        }
    }

    #[test]
    fn perfect_positive_and_negative_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let up = [10.0, 20.0, 30.0, 40.0];
        let down = [40.0, 30.0, 20.0, 10.0];
        assert!((pearson(&xs, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_explicitly_undefined() {
        assert_eq!(pearson(&[], &[]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[3.0]), None);
        // Zero variance on either side.
        assert_eq!(pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
    }

    #[test]
    fn loc_complexity_correlation_on_proportional_metrics() {
        let metrics = vec![
            metric("a.py", 100, 10),
            metric("b.py", 200, 20),
            metric("c.py", 300, 30),
        ];
        let r = loc_complexity_correlation(&metrics).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_defect_entries_join_as_zero() {
        let metrics = vec![
            metric("a.py", 10, 1),
            metric("b.py", 20, 2),
            metric("c.py", 30, 3),
        ];
        let mut defects = HashMap::new();
        defects.insert(FileKey::new("c.py"), 6u32);
        defects.insert(FileKey::new("b.py"), 3u32);
        // a.py joins as 0: defects = [0, 3, 6], complexity = [1, 2, 3].
        let result = correlate_defects(&metrics, &defects, 0.90);
        assert!((result.complexity_defects.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn decile_means_split_at_threshold() {
        let mut metrics: Vec<FileMetric> =
            (0..9).map(|i| metric(&format!("f{i}.py"), 10, 1)).collect();
        metrics.push(metric("hot.py", 10, 100));

        let mut defects = HashMap::new();
        defects.insert(FileKey::new("hot.py"), 8u32);
        defects.insert(FileKey::new("f0.py"), 1u32);

        let result = correlate_defects(&metrics, &defects, 0.90);
        // Top decile is only hot.py (threshold 10.9); the rest average 1/9.
        assert_eq!(result.mean_defects_top_decile, Some(8.0));
        let rest = result.mean_defects_rest.unwrap();
        assert!((rest - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn empty_metrics_yield_all_undefined() {
        let result = correlate_defects(&[], &HashMap::new(), 0.90);
        assert!(result.complexity_defects.is_none());
        assert!(result.loc_defects.is_none());
        assert!(result.mean_defects_top_decile.is_none());
        assert!(result.mean_defects_rest.is_none());
    }
}
