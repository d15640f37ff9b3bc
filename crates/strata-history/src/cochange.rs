//! Single-pass co-change aggregation.
//!
//! Accumulates per-file touch counts and per-unordered-pair co-touch counts
//! over a stream of commits. The state is explicit and owned, so sharded
//! traversals can each build their own counts and reduce by summation.

use std::collections::{BTreeSet, HashMap};

use strata_core::FileKey;

use crate::mining::CommitInfo;

/// Owned aggregation state: touch and co-change counters.
///
/// Counters are monotone non-decreasing during a traversal; once the pass
/// is complete the state is read-only by convention.
///
/// Pair keys are stored canonically with the lexicographically smaller file
/// first, so `(a, b)` and `(b, a)` are never tracked as distinct entries.
///
/// # Examples
///
/// ```
/// use strata_core::FileKey;
/// use strata_history::cochange::CoChangeCounts;
/// use strata_history::mining::{CommitInfo, FileChange};
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
/// counts.ingest(&commit, |k| k.has_extension("py"));
/// assert_eq!(counts.touch_count(&FileKey::new("a.py")), 1);
/// assert_eq!(counts.pair_count(&FileKey::new("b.py"), &FileKey::new("a.py")), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoChangeCounts {
    touches: HashMap<FileKey, u32>,
    pairs: HashMap<(FileKey, FileKey), u32>,
}

impl CoChangeCounts {
    /// Fresh, empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one commit into the counters.
    ///
    /// The set of distinct qualifying effective paths is computed first
    /// (a commit cannot touch the same file twice for counting purposes);
    /// an empty set is a no-op. Every key in the set gets one touch, and
    /// if the set has n ≥ 2 members, each of the C(n, 2) unordered pairs
    /// gets one co-change.
    ///
    /// Pair enumeration is O(n²) in the number of qualifying files the
    /// commit touches. Per-commit file counts are small in practice;
    /// callers worried about pathological commits (mass renames touching
    /// thousands of files) should cap them at mining time.
    pub fn ingest<F>(&mut self, commit: &CommitInfo, qualifies: F)
    where
        F: Fn(&FileKey) -> bool,
    {
        let touched: BTreeSet<&FileKey> = commit
            .files_changed
            .iter()
            .filter_map(|c| c.effective_path())
            .filter(|k| qualifies(k))
            .collect();
        if touched.is_empty() {
            return;
        }

        for key in &touched {
            *self.touches.entry((*key).clone()).or_default() += 1;
        }

        // BTreeSet iteration is sorted, so (files[i], files[j]) with i < j
        // is already the canonical pair ordering.
        let files: Vec<&FileKey> = touched.into_iter().collect();
        for i in 0..files.len() {
            for j in (i + 1)..files.len() {
                let key = (files[i].clone(), files[j].clone());
                *self.pairs.entry(key).or_default() += 1;
            }
        }
    }

    /// Sum another state into this one.
    ///
    /// Touch and pair counting are commutative and associative, so shards
    /// of history can be aggregated independently and reduced with `merge`.
    pub fn merge(&mut self, other: CoChangeCounts) {
        for (key, count) in other.touches {
            *self.touches.entry(key).or_default() += count;
        }
        for (key, count) in other.pairs {
            *self.pairs.entry(key).or_default() += count;
        }
    }

    /// Number of ingested commits that touched `key`.
    pub fn touch_count(&self, key: &FileKey) -> u32 {
        self.touches.get(key).copied().unwrap_or(0)
    }

    /// Number of ingested commits that touched both files, in either order.
    pub fn pair_count(&self, a: &FileKey, b: &FileKey) -> u32 {
        let key = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        self.pairs.get(&key).copied().unwrap_or(0)
    }

    /// All per-file touch counters.
    pub fn touches(&self) -> &HashMap<FileKey, u32> {
        &self.touches
    }

    /// All canonical-ordered pair counters.
    pub fn pairs(&self) -> &HashMap<(FileKey, FileKey), u32> {
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::FileChange;

    fn make_commit(message: &str, files: Vec<&str>) -> CommitInfo {
        CommitInfo {
            hash: "abc".into(),
            author: "alice".into(),
            email: "alice@example.com".into(),
            timestamp: 1000,
            tz_offset_minutes: 0,
            message: message.into(),
            files_changed: files
                .into_iter()
                .map(|path| FileChange {
                    old_path: None,
                    new_path: Some(FileKey::new(path)),
                })
                .collect(),
        }
    }

    fn ingest_all(commits: &[CommitInfo]) -> CoChangeCounts {
        let mut counts = CoChangeCounts::new();
        for commit in commits {
            counts.ingest(commit, |k| k.has_extension("py"));
        }
        counts
    }

    #[test]
    fn three_commit_scenario_produces_expected_counters() {
        let commits = vec![
            make_commit("fix bug in parser", vec!["a.py", "b.py"]),
            make_commit("refactor", vec!["a.py"]),
            make_commit("fix issue", vec!["a.py", "b.py", "c.py"]),
        ];
        let counts = ingest_all(&commits);

        let a = FileKey::new("a.py");
        let b = FileKey::new("b.py");
        let c = FileKey::new("c.py");
        assert_eq!(counts.touch_count(&a), 3);
        assert_eq!(counts.touch_count(&b), 2);
        assert_eq!(counts.touch_count(&c), 1);
        assert_eq!(counts.pair_count(&a, &b), 2);
        assert_eq!(counts.pair_count(&a, &c), 1);
        assert_eq!(counts.pair_count(&b, &c), 1);
        assert_eq!(counts.pairs().len(), 3);
    }

    #[test]
    fn per_commit_totals_match_combinatorics() {
        // n qualifying files: n touches and C(n, 2) pairs from one commit.
        let commit = make_commit("change", vec!["a.py", "b.py", "c.py", "d.py"]);
        let mut counts = CoChangeCounts::new();
        counts.ingest(&commit, |_| true);

        let touch_total: u32 = counts.touches().values().sum();
        let pair_total: u32 = counts.pairs().values().sum();
        assert_eq!(touch_total, 4);
        assert_eq!(pair_total, 6); // C(4, 2)
    }

    #[test]
    fn duplicate_touches_count_once_per_commit() {
        let commit = make_commit("rename plus edit", vec!["a.py", "a.py", "b.py"]);
        let mut counts = CoChangeCounts::new();
        counts.ingest(&commit, |_| true);
        assert_eq!(counts.touch_count(&FileKey::new("a.py")), 1);
        assert_eq!(
            counts.pair_count(&FileKey::new("a.py"), &FileKey::new("b.py")),
            1
        );
    }

    #[test]
    fn non_qualifying_and_empty_commits_are_noops() {
        let commits = vec![
            make_commit("docs", vec!["README.md"]),
            make_commit("empty", vec![]),
        ];
        let counts = ingest_all(&commits);
        assert!(counts.touches().is_empty());
        assert!(counts.pairs().is_empty());
    }

    #[test]
    fn single_file_commit_produces_no_pairs() {
        let counts = ingest_all(&[make_commit("solo", vec!["a.py"])]);
        assert_eq!(counts.touch_count(&FileKey::new("a.py")), 1);
        assert!(counts.pairs().is_empty());
    }

    #[test]
    fn pair_keys_are_canonical_regardless_of_input_order() {
        let counts = ingest_all(&[
            make_commit("one", vec!["z.py", "a.py"]),
            make_commit("two", vec!["a.py", "z.py"]),
        ]);
        assert_eq!(counts.pairs().len(), 1);
        let ((first, second), count) = counts.pairs().iter().next().unwrap();
        assert_eq!(first.as_str(), "a.py");
        assert_eq!(second.as_str(), "z.py");
        assert_eq!(*count, 2);
    }

    #[test]
    fn merge_equals_single_pass() {
        let commits = vec![
            make_commit("fix bug", vec!["a.py", "b.py"]),
            make_commit("refactor", vec!["a.py"]),
            make_commit("fix issue", vec!["a.py", "b.py", "c.py"]),
        ];
        let whole = ingest_all(&commits);

        let mut left = ingest_all(&commits[..1]);
        let right = ingest_all(&commits[1..]);
        left.merge(right);

        assert_eq!(left.touches(), whole.touches());
        assert_eq!(left.pairs(), whole.pairs());
    }
}
