//! Logical coupling detection.
//!
//! Turns aggregated co-change counters into normalized coupling records:
//! pairs of files that change together often relative to how often each
//! changes individually, which may indicate hidden dependencies.

use serde::{Deserialize, Serialize};
use strata_core::FileKey;
use strata_history::cochange::CoChangeCounts;

/// A pair of files that frequently change together.
///
/// `score = commits_together / min(commits_a, commits_b)`, which lies in
/// `(0, 1]` for any emitted record since a pair cannot co-change more often
/// than its rarer member changes at all.
///
/// # Examples
///
/// ```
/// use strata_core::FileKey;
/// use strata_analytics::coupling::CouplingRecord;
///
/// let record = CouplingRecord {
///     file_a: FileKey::new("src/auth.py"),
///     file_b: FileKey::new("src/session.py"),
///     commits_together: 6,
///     commits_a: 10,
///     commits_b: 8,
///     score: 0.75,
/// };
/// assert!(record.score > 0.5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplingRecord {
    /// First file in the pair (lexicographically smaller).
    pub file_a: FileKey,
    /// Second file in the pair.
    pub file_b: FileKey,
    /// Number of commits touching both files.
    pub commits_together: u32,
    /// Total commits touching `file_a`.
    pub commits_a: u32,
    /// Total commits touching `file_b`.
    pub commits_b: u32,
    /// `commits_together / min(commits_a, commits_b)`.
    pub score: f64,
}

/// Emit coupling records for every pair with at least `min_pair_commits`
/// co-changes.
///
/// Pairs below the threshold are noise and excluded; this is a lookup miss,
/// not an error. Records are sorted by score descending, ties broken by
/// `commits_together` descending, then by pair for determinism.
///
/// # Examples
///
/// ```
/// use strata_core::FileKey;
/// use strata_history::cochange::CoChangeCounts;
/// use strata_history::mining::{CommitInfo, FileChange};
/// use strata_analytics::coupling::coupling_records;
///
/// let commit = CommitInfo {
///     hash: "abc".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     timestamp: 1000,
///     tz_offset_minutes: 0,
///     message: "change".into(),
///     files_changed: vec![
///         FileChange { old_path: None, new_path: Some(FileKey::new("a.py")) },
///         FileChange { old_path: None, new_path: Some(FileKey::new("b.py")) },
///     ],
/// };
/// let mut counts = CoChangeCounts::new();
/// counts.ingest(&commit, |_| true);
/// let records = coupling_records(&counts, 1);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].score, 1.0);
/// ```
pub fn coupling_records(counts: &CoChangeCounts, min_pair_commits: u32) -> Vec<CouplingRecord> {
    let mut records = Vec::new();

    for ((file_a, file_b), together) in counts.pairs() {
        if *together < min_pair_commits {
            continue;
        }

        let commits_a = counts.touch_count(file_a);
        let commits_b = counts.touch_count(file_b);
        let rarer = commits_a.min(commits_b);
        if rarer == 0 {
            continue;
        }

        records.push(CouplingRecord {
            file_a: file_a.clone(),
            file_b: file_b.clone(),
            commits_together: *together,
            commits_a,
            commits_b,
            score: f64::from(*together) / f64::from(rarer),
        });
    }

    records.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.commits_together.cmp(&a.commits_together))
            .then_with(|| (&a.file_a, &a.file_b).cmp(&(&b.file_a, &b.file_b)))
    });

    records
}

/// Restrict coupling records to test/code pairs.
///
/// Keeps only pairs where exactly one side is a test file by the filename
/// prefix convention; test/test and code/code pairs are dropped. Used to
/// measure test–code logical coupling specifically.
pub fn test_code_coupling(records: &[CouplingRecord], test_prefix: &str) -> Vec<CouplingRecord> {
    records
        .iter()
        .filter(|r| r.file_a.is_test_file(test_prefix) != r.file_b.is_test_file(test_prefix))
        .cloned()
        .collect()
}
