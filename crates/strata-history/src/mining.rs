//! Git history extraction via git2.
//!
//! Mines commit history from a repository, extracting per-commit file
//! changes (old and new paths, with rename detection), author info, and
//! timestamps with their recorded UTC offsets.

use std::path::Path;

use git2::{Delta, DiffOptions, Repository, Sort};
use serde::{Deserialize, Serialize};
use strata_core::{FileKey, StrataError};

/// Raw commit data extracted from git history.
///
/// Immutable after mining; every downstream analysis consumes these records
/// in a single streaming pass.
///
/// # Examples
///
/// ```
/// use strata_history::mining::CommitInfo;
///
/// let info = CommitInfo {
///     hash: "abc123".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     timestamp: 1700000000,
///     tz_offset_minutes: 60,
///     message: "fix: off-by-one in pagination".into(),
///     files_changed: vec![],
/// };
/// assert_eq!(info.author, "alice");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    /// Short commit hash.
    pub hash: String,
    /// Author name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Unix timestamp of the commit.
    pub timestamp: i64,
    /// UTC offset recorded with the commit, in minutes.
    pub tz_offset_minutes: i32,
    /// Full commit message.
    pub message: String,
    /// Files modified in this commit.
    pub files_changed: Vec<FileChange>,
}

/// A single file change within a commit.
///
/// Carries both sides of the change; either side may be absent (added or
/// deleted files). A change with neither path is invalid and is skipped at
/// extraction time.
///
/// # Examples
///
/// ```
/// use strata_core::FileKey;
/// use strata_history::mining::FileChange;
///
/// let change = FileChange {
///     old_path: Some(FileKey::new("src/old.py")),
///     new_path: Some(FileKey::new("src/new.py")),
/// };
/// assert_eq!(change.effective_path().unwrap().as_str(), "src/new.py");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Path before the change, if the file existed.
    pub old_path: Option<FileKey>,
    /// Path after the change, if the file still exists.
    pub new_path: Option<FileKey>,
}

impl FileChange {
    /// The path this change is counted under: the new path when present,
    /// otherwise the old path.
    pub fn effective_path(&self) -> Option<&FileKey> {
        self.new_path.as_ref().or(self.old_path.as_ref())
    }
}

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use strata_history::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert!(opts.since.is_none());
/// assert!(opts.max_files_per_commit.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// Inclusive start timestamp; commits older than this are not returned.
    pub since: Option<i64>,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
    /// Skip commits touching more files than this. Co-change aggregation is
    /// quadratic in the per-commit file count, so this caps the damage from
    /// pathological commits such as mass renames.
    pub max_files_per_commit: Option<usize>,
}

/// Mine commit history from a git repository.
///
/// Returns commits in reverse chronological order (newest first). The walk
/// stops at the first commit older than `options.since`, so the log is
/// consumed exactly once and nothing beyond the returned records is
/// retained.
///
/// # Errors
///
/// Returns [`StrataError::Git`] if the repository cannot be opened or walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use strata_history::mining::{mine_history, MiningOptions};
///
/// let commits = mine_history(Path::new("."), &MiningOptions::default()).unwrap();
/// for c in &commits {
///     println!("{}: {}", c.hash, c.message.lines().next().unwrap_or(""));
/// }
/// ```
pub fn mine_history(
    repo_path: &Path,
    options: &MiningOptions,
) -> Result<Vec<CommitInfo>, StrataError> {
    let repo = Repository::open(repo_path)
        .map_err(|e| StrataError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| StrataError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk.set_sorting(Sort::TIME).ok();

    if let Some(ref branch) = options.branch {
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| StrataError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
        let oid = reference
            .target()
            .ok_or_else(|| StrataError::Git("branch has no target".into()))?;
        revwalk
            .push(oid)
            .map_err(|e| StrataError::Git(format!("failed to push oid: {e}")))?;
    } else {
        revwalk
            .push_head()
            .map_err(|e| StrataError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| StrataError::Git(format!("revwalk error: {e}")))?;

        let commit = repo
            .find_commit(oid)
            .map_err(|e| StrataError::Git(format!("failed to find commit: {e}")))?;

        let timestamp = commit.time().seconds();
        if let Some(since) = options.since {
            if timestamp < since {
                break;
            }
        }

        let files_changed = extract_file_changes(&repo, &commit)?;

        if let Some(cap) = options.max_files_per_commit {
            if files_changed.len() > cap {
                continue;
            }
        }

        let author = commit.author();
        let hash = oid.to_string();

        commits.push(CommitInfo {
            hash: hash[..hash.len().min(8)].to_string(),
            author: author.name().unwrap_or("unknown").to_string(),
            email: author.email().unwrap_or("unknown").to_string(),
            timestamp,
            tz_offset_minutes: commit.time().offset_minutes(),
            message: commit.message().unwrap_or("").to_string(),
            files_changed,
        });
    }

    Ok(commits)
}

fn extract_file_changes(
    repo: &Repository,
    commit: &git2::Commit,
) -> Result<Vec<FileChange>, StrataError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| StrataError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| StrataError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| StrataError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| StrataError::Git(format!("failed to compute diff: {e}")))?;

    let mut find_opts = git2::DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| StrataError::Git(format!("failed to find renames: {e}")))?;

    let mut changes = Vec::new();

    for delta in diff.deltas() {
        let old_path = delta
            .old_file()
            .path()
            .map(|p| FileKey::new(&p.to_string_lossy()));
        let new_path = delta
            .new_file()
            .path()
            .map(|p| FileKey::new(&p.to_string_lossy()));

        let change = match delta.status() {
            Delta::Added => FileChange {
                old_path: None,
                new_path,
            },
            Delta::Deleted => FileChange {
                old_path,
                new_path: None,
            },
            _ => FileChange { old_path, new_path },
        };

        // A change with no path on either side carries no information.
        if change.effective_path().is_none() {
            continue;
        }
        changes.push(change);
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use std::path::PathBuf;

    /// Create a git repo in a temp dir and commit `files` (path, content)
    /// with the given message and timestamp.
    pub(crate) fn commit_files(
        repo: &Repository,
        root: &Path,
        message: &str,
        timestamp: i64,
        files: &[(&str, &str)],
    ) {
        for (path, content) in files {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, content).unwrap();
        }

        let mut index = repo.index().unwrap();
        for (path, _) in files {
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let sig = Signature::new("alice", "alice@example.com", &git2::Time::new(timestamp, 0))
            .unwrap();
        let parent = repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .and_then(|oid| repo.find_commit(oid).ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    fn make_repo() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        Repository::init(&root).unwrap();
        (dir, root)
    }

    #[test]
    fn mine_returns_commits_newest_first() {
        let (_dir, root) = make_repo();
        let repo = Repository::open(&root).unwrap();
        commit_files(&repo, &root, "initial", 1_000_000, &[("a.py", "x = 1\n")]);
        commit_files(&repo, &root, "fix bug", 2_000_000, &[("a.py", "x = 2\n")]);

        let commits = mine_history(&root, &MiningOptions::default()).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message, "fix bug");
        assert_eq!(commits[1].message, "initial");
        assert_eq!(commits[0].author, "alice");
        assert!(!commits[0].hash.is_empty());
    }

    #[test]
    fn since_is_an_inclusive_start() {
        let (_dir, root) = make_repo();
        let repo = Repository::open(&root).unwrap();
        commit_files(&repo, &root, "old", 1_000_000, &[("a.py", "1\n")]);
        commit_files(&repo, &root, "boundary", 2_000_000, &[("a.py", "2\n")]);
        commit_files(&repo, &root, "new", 3_000_000, &[("a.py", "3\n")]);

        let opts = MiningOptions {
            since: Some(2_000_000),
            ..MiningOptions::default()
        };
        let commits = mine_history(&root, &opts).unwrap();
        let messages: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["new", "boundary"]);
    }

    #[test]
    fn file_changes_carry_paths() {
        let (_dir, root) = make_repo();
        let repo = Repository::open(&root).unwrap();
        commit_files(
            &repo,
            &root,
            "add two files",
            1_000_000,
            &[("src/a.py", "a\n"), ("src/b.py", "b\n")],
        );

        let commits = mine_history(&root, &MiningOptions::default()).unwrap();
        let paths: Vec<&str> = commits[0]
            .files_changed
            .iter()
            .filter_map(|c| c.effective_path())
            .map(|k| k.as_str())
            .collect();
        assert!(paths.contains(&"src/a.py"));
        assert!(paths.contains(&"src/b.py"));
        // Newly added files have no old path.
        assert!(commits[0].files_changed.iter().all(|c| c.old_path.is_none()));
    }

    #[test]
    fn large_commits_are_skipped_when_capped() {
        let (_dir, root) = make_repo();
        let repo = Repository::open(&root).unwrap();
        commit_files(
            &repo,
            &root,
            "mass change",
            1_000_000,
            &[("a.py", "1\n"), ("b.py", "2\n"), ("c.py", "3\n")],
        );
        commit_files(&repo, &root, "small", 2_000_000, &[("a.py", "4\n")]);

        let opts = MiningOptions {
            max_files_per_commit: Some(2),
            ..MiningOptions::default()
        };
        let commits = mine_history(&root, &opts).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "small");
    }

    #[test]
    fn effective_path_prefers_new() {
        let change = FileChange {
            old_path: Some(FileKey::new("old.py")),
            new_path: Some(FileKey::new("new.py")),
        };
        assert_eq!(change.effective_path().unwrap().as_str(), "new.py");

        let deleted = FileChange {
            old_path: Some(FileKey::new("gone.py")),
            new_path: None,
        };
        assert_eq!(deleted.effective_path().unwrap().as_str(), "gone.py");

        let invalid = FileChange {
            old_path: None,
            new_path: None,
        };
        assert!(invalid.effective_path().is_none());
    }
}
