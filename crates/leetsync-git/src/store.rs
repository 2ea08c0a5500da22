//! Repository store trait and the values that cross it

use std::fmt;

use crate::{Error, Result};

/// Hex object name of a tree or commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, for log output.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(7);
        &self.0[..end]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<git2::Oid> for ObjectId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

/// Commit and tree a branch currently points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTip {
    pub commit: ObjectId,
    pub tree: ObjectId,
}

/// File mode of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    #[default]
    Blob,
    Executable,
}

impl EntryMode {
    /// Octal mode string used by the git wire formats.
    pub fn as_octal(self) -> &'static str {
        match self {
            EntryMode::Blob => "100644",
            EntryMode::Executable => "100755",
        }
    }
}

impl From<EntryMode> for git2::FileMode {
    fn from(mode: EntryMode) -> Self {
        match mode {
            EntryMode::Blob => git2::FileMode::Blob,
            EntryMode::Executable => git2::FileMode::BlobExecutable,
        }
    }
}

/// One file to layer onto a base tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Slash-separated path relative to the repository root
    pub path: String,
    pub mode: EntryMode,
    pub content: Vec<u8>,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            mode: EntryMode::Blob,
            content: content.into(),
        }
    }
}

/// A commit as seen while walking history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: ObjectId,
    pub message: String,
    /// Committer time in seconds since the Unix epoch
    pub time: i64,
}

/// Repository mutation API consumed by the sync engine.
///
/// Every method is a single request-response; none of them retry.
pub trait RepositoryStore {
    /// Human-readable name of the target, for logs and errors.
    fn describe(&self) -> String;

    /// Branch new commits go to when none is configured.
    fn default_branch(&self) -> Result<String>;

    /// Read the current tip of `branch`, or `None` if the branch is unborn.
    fn branch_tip(&self, branch: &str) -> Result<Option<BranchTip>>;

    /// All blob paths reachable from `tree`, slash-separated.
    fn list_paths(&self, tree: &ObjectId) -> Result<Vec<String>>;

    /// One page of history starting at `from`, newest first.
    ///
    /// An empty page means history is exhausted.
    fn history(&self, from: &ObjectId, page: usize, per_page: usize) -> Result<Vec<CommitRecord>>;

    /// Create a tree that is `base` with `entries` added or replaced.
    fn create_tree(&self, base: Option<&ObjectId>, entries: &[TreeEntry]) -> Result<ObjectId>;

    /// Create a commit object. Does not move any reference.
    fn create_commit(&self, tree: &ObjectId, parents: &[ObjectId], message: &str)
    -> Result<ObjectId>;

    /// Point `branch` at `new`.
    ///
    /// Unless `force` is set the update only succeeds while the branch still
    /// points at `expected` (`None` meaning the branch must not exist yet);
    /// otherwise it fails with [`Error::RefConflict`].
    ///
    /// [`LocalStore`](crate::LocalStore) checks this atomically.
    /// [`GithubStore`](crate::GithubStore) can only read the branch and then
    /// issue a fast-forward-only update, so a rewind to an ancestor of
    /// `expected` in between those two requests goes undetected.
    fn update_branch(
        &self,
        branch: &str,
        new: &ObjectId,
        expected: Option<&ObjectId>,
        force: bool,
    ) -> Result<()>;
}

impl<T: RepositoryStore + ?Sized> RepositoryStore for &T {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn default_branch(&self) -> Result<String> {
        (**self).default_branch()
    }

    fn branch_tip(&self, branch: &str) -> Result<Option<BranchTip>> {
        (**self).branch_tip(branch)
    }

    fn list_paths(&self, tree: &ObjectId) -> Result<Vec<String>> {
        (**self).list_paths(tree)
    }

    fn history(&self, from: &ObjectId, page: usize, per_page: usize) -> Result<Vec<CommitRecord>> {
        (**self).history(from, page, per_page)
    }

    fn create_tree(&self, base: Option<&ObjectId>, entries: &[TreeEntry]) -> Result<ObjectId> {
        (**self).create_tree(base, entries)
    }

    fn create_commit(
        &self,
        tree: &ObjectId,
        parents: &[ObjectId],
        message: &str,
    ) -> Result<ObjectId> {
        (**self).create_commit(tree, parents, message)
    }

    fn update_branch(
        &self,
        branch: &str,
        new: &ObjectId,
        expected: Option<&ObjectId>,
        force: bool,
    ) -> Result<()> {
        (**self).update_branch(branch, new, expected, force)
    }
}

/// Reject paths that would escape the repository root or address git internals.
pub fn validate_path(path: &str) -> Result<()> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|segment| {
                segment.is_empty() || segment == "." || segment == ".." || segment == ".git"
            });

    if invalid {
        return Err(Error::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(())
}
