//! Defect commit classification and derived defect statistics.
//!
//! A commit is defect-related iff its message contains one of a fixed
//! keyword vocabulary as a whole word, case-insensitively. Classification is
//! a pure function of the message and is never revisited.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use strata_core::{FileKey, StrataError};

use crate::mining::CommitInfo;

/// Classifies commits as defect-related by keyword matching on the message.
///
/// The pattern is compiled once at construction; the classifier owns it
/// rather than relying on a process-wide static, so tests and sharded runs
/// get deterministic, isolated state.
///
/// # Examples
///
/// ```
/// use strata_core::HistoryConfig;
/// use strata_history::classify::DefectClassifier;
///
/// let classifier = DefectClassifier::new(&HistoryConfig::default().defect_keywords).unwrap();
/// assert!(classifier.is_defect("Fix bug in parser"));
/// assert!(!classifier.is_defect("add prefix support"));
/// ```
#[derive(Debug, Clone)]
pub struct DefectClassifier {
    pattern: Regex,
}

impl DefectClassifier {
    /// Build a classifier matching any of `keywords` as a whole word,
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Config`] if `keywords` is empty.
    pub fn new(keywords: &[String]) -> Result<Self, StrataError> {
        if keywords.is_empty() {
            return Err(StrataError::Config(
                "defect keyword list must not be empty".into(),
            ));
        }
        let escaped: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|")))
            .map_err(|e| StrataError::Config(format!("invalid defect keyword pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Whether `message` marks a defect-related commit.
    ///
    /// Pure and idempotent; whitespace padding and case changes do not
    /// affect the result. Empty or whitespace-only messages are not
    /// defect-related.
    pub fn is_defect(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }

    /// Per-calendar-month histogram of defect-commit counts, keyed
    /// `"YYYY-MM"`.
    ///
    /// Each commit is bucketed in its own recorded UTC offset, not a
    /// normalized timezone. For history with geographically mixed
    /// contributors this can shift commits near month boundaries between
    /// adjacent buckets.
    pub fn defects_per_month(&self, commits: &[CommitInfo]) -> BTreeMap<String, u32> {
        let mut histogram = BTreeMap::new();
        for commit in commits {
            if !self.is_defect(&commit.message) {
                continue;
            }
            if let Some(month) = month_key(commit.timestamp, commit.tz_offset_minutes) {
                *histogram.entry(month).or_default() += 1;
            }
        }
        histogram
    }

    /// Per-file count of defect commits touching it, restricted to files
    /// with the given source extension.
    ///
    /// A commit touching the same file through several changes (e.g. a
    /// rename plus an edit) counts once.
    pub fn defect_touches_per_file(
        &self,
        commits: &[CommitInfo],
        extension: &str,
    ) -> HashMap<FileKey, u32> {
        let mut counts: HashMap<FileKey, u32> = HashMap::new();
        for commit in commits {
            if !self.is_defect(&commit.message) {
                continue;
            }
            let touched: HashSet<&FileKey> = commit
                .files_changed
                .iter()
                .filter_map(|c| c.effective_path())
                .filter(|k| k.has_extension(extension))
                .collect();
            for key in touched {
                *counts.entry(key.clone()).or_default() += 1;
            }
        }
        counts
    }

    /// Monthly defect histogram restricted to a set of files.
    ///
    /// Counts one increment per matching file per commit, so a defect
    /// commit touching two of the tracked files contributes two to its
    /// month, while repeated changes to the same file (a rename plus an
    /// edit) contribute one.
    pub fn defects_per_month_for_files(
        &self,
        commits: &[CommitInfo],
        files: &HashSet<FileKey>,
    ) -> BTreeMap<String, u32> {
        let mut histogram = BTreeMap::new();
        for commit in commits {
            if !self.is_defect(&commit.message) {
                continue;
            }
            let Some(month) = month_key(commit.timestamp, commit.tz_offset_minutes) else {
                continue;
            };
            let touched: HashSet<&FileKey> = commit
                .files_changed
                .iter()
                .filter_map(|c| c.effective_path())
                .filter(|k| files.contains(*k))
                .collect();
            if touched.is_empty() {
                continue;
            }
            *histogram.entry(month).or_default() += touched.len() as u32;
        }
        histogram
    }
}

/// The `n` most-touched files, by descending count with lexicographic
/// tie-break.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use strata_core::FileKey;
/// use strata_history::classify::top_files;
///
/// let mut counts = HashMap::new();
/// counts.insert(FileKey::new("a.py"), 3u32);
/// counts.insert(FileKey::new("b.py"), 5u32);
/// counts.insert(FileKey::new("c.py"), 3u32);
/// let top = top_files(&counts, 2);
/// assert_eq!(top[0].as_str(), "b.py");
/// assert_eq!(top[1].as_str(), "a.py");
/// ```
pub fn top_files(counts: &HashMap<FileKey, u32>, n: usize) -> Vec<FileKey> {
    let mut entries: Vec<(&FileKey, u32)> = counts.iter().map(|(k, v)| (k, *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.into_iter().take(n).map(|(k, _)| k.clone()).collect()
}

/// Truncate a timestamp to `"YYYY-MM"` in the commit's own UTC offset.
fn month_key(timestamp: i64, tz_offset_minutes: i32) -> Option<String> {
    let offset = FixedOffset::east_opt(tz_offset_minutes * 60)?;
    let utc = DateTime::from_timestamp(timestamp, 0)?;
    Some(utc.with_timezone(&offset).format("%Y-%m").to_string())
}
