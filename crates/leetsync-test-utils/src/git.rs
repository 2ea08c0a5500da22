//! Git repository fixtures.
//!
//! All fixtures use `git2` directly so tests do not depend on a `git`
//! binary or on the user's git configuration.

use std::path::Path;

use git2::build::TreeUpdateBuilder;
use git2::{FileMode, Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// Branch every fixture repository starts on.
pub const DEFAULT_BRANCH: &str = "main";

/// One commit on a first-parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub id: Oid,
    pub parents: Vec<Oid>,
    pub message: String,
}

/// Initialise an empty bare repository whose HEAD points at `main`.
///
/// # Panics
/// Panics if the repository cannot be created.
pub fn bare_repo(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).initial_head(DEFAULT_BRANCH);
    Repository::init_opts(path, &opts)
        .unwrap_or_else(|e| panic!("bare_repo: failed to init at {}: {e}", path.display()))
}

/// Bare repository in a fresh temporary directory.
///
/// The directory is removed when the returned [`TempDir`] is dropped.
pub fn temp_bare_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().expect("temp_bare_repo: failed to create temp dir");
    let repo = bare_repo(dir.path());
    (dir, repo)
}

/// Initialise an empty repository with a working tree, HEAD at `main`.
///
/// # Panics
/// Panics if the repository cannot be created.
pub fn worktree_repo(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(DEFAULT_BRANCH);
    Repository::init_opts(path, &opts)
        .unwrap_or_else(|e| panic!("worktree_repo: failed to init at {}: {e}", path.display()))
}

/// Commit `files` on top of `branch` (creating the branch if unborn) and
/// return the new commit id. Existing files not listed are kept.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_files(repo: &Repository, branch: &str, files: &[(&str, &str)], message: &str) -> Oid {
    let refname = format!("refs/heads/{branch}");
    let parent = repo
        .find_reference(&refname)
        .ok()
        .map(|r| r.peel_to_commit().expect("commit_files: branch does not point at a commit"));

    let baseline = match &parent {
        Some(commit) => commit.tree().expect("commit_files: parent has no tree"),
        None => {
            let empty = repo.treebuilder(None).unwrap().write().unwrap();
            repo.find_tree(empty).unwrap()
        }
    };

    let mut update = TreeUpdateBuilder::new();
    for (path, content) in files {
        let blob = repo.blob(content.as_bytes()).unwrap();
        update.upsert(*path, blob, FileMode::Blob);
    }
    let tree_id = update.create_updated(repo, &baseline).unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let signature = Signature::now("Test User", "test@example.com").unwrap();
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some(&refname), &signature, &signature, message, &tree, &parents)
        .unwrap_or_else(|e| panic!("commit_files: commit failed: {e}"))
}

/// Current tip of `branch`, if any.
pub fn branch_tip(repo: &Repository, branch: &str) -> Option<Oid> {
    repo.find_reference(&format!("refs/heads/{branch}"))
        .ok()
        .and_then(|r| r.target())
}

/// Walk first parents from the tip of `branch`, oldest commit first.
pub fn first_parent_chain(repo: &Repository, branch: &str) -> Vec<ChainLink> {
    let mut links = Vec::new();
    let mut next = branch_tip(repo, branch);

    while let Some(id) = next {
        let commit = repo.find_commit(id).unwrap();
        let parents: Vec<Oid> = commit.parent_ids().collect();
        next = parents.first().copied();
        links.push(ChainLink {
            id,
            parents,
            message: commit.message().unwrap_or("").to_string(),
        });
    }

    links.reverse();
    links
}

/// Number of commits reachable from `branch`.
pub fn commit_count(repo: &Repository, branch: &str) -> usize {
    first_parent_chain(repo, branch).len()
}

/// Read a file from the tree at the tip of `branch`.
pub fn read_file(repo: &Repository, branch: &str, path: &str) -> Option<String> {
    let tip = branch_tip(repo, branch)?;
    let tree = repo.find_commit(tip).ok()?.tree().ok()?;
    let entry = tree.get_path(Path::new(path)).ok()?;
    let blob = repo.find_blob(entry.id()).ok()?;
    Some(String::from_utf8_lossy(blob.content()).into_owned())
}

/// All blob paths in the tree at the tip of `branch`, sorted.
pub fn list_files(repo: &Repository, branch: &str) -> Vec<String> {
    let Some(tip) = branch_tip(repo, branch) else {
        return Vec::new();
    };
    let tree = repo.find_commit(tip).unwrap().tree().unwrap();

    let mut paths = Vec::new();
    tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(git2::ObjectType::Blob) {
            paths.push(format!("{root}{}", entry.name().unwrap_or("")));
        }
        git2::TreeWalkResult::Ok
    })
    .unwrap();
    paths.sort();
    paths
}
