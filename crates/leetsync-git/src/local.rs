//! Local repository store backed by `git2`

use std::path::Path;

use git2::build::{CheckoutBuilder, TreeUpdateBuilder};
use git2::{
    Commit, ErrorCode, ObjectType, Oid, Repository, Signature, Sort, StatusOptions, TreeWalkMode,
    TreeWalkResult,
};

use crate::store::{BranchTip, CommitRecord, ObjectId, RepositoryStore, TreeEntry, validate_path};
use crate::{Error, Result};

const DEFAULT_AUTHOR_NAME: &str = "leetsync";
const DEFAULT_AUTHOR_EMAIL: &str = "leetsync@users.noreply.github.com";

/// Object-level access to a local git repository.
///
/// Trees and commits are written straight into the object database. When
/// the repository has a working tree and HEAD points at the branch being
/// advanced, the working tree follows the branch after every reference
/// update, unless it holds uncommitted changes to tracked files. Those are
/// never touched; the checkout is skipped with a warning instead.
pub struct LocalStore {
    repo: Repository,
    author_name: String,
    author_email: String,
}

impl LocalStore {
    /// Open an existing repository (bare or not).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                Error::RepositoryNotFound {
                    repository: path.display().to_string(),
                }
            } else {
                Error::Git(e)
            }
        })?;
        Ok(Self::from_repository(repo))
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self {
            repo,
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }

    /// Identity used as author and committer of new commits.
    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn find_commit(&self, id: &ObjectId) -> Result<Commit<'_>> {
        Ok(self.repo.find_commit(oid(id)?)?)
    }

    /// Whether tracked files differ from HEAD in the index or on disk.
    fn has_uncommitted_changes(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    fn head_points_at(&self, refname: &str) -> bool {
        self.repo
            .find_reference("HEAD")
            .ok()
            .and_then(|head| head.symbolic_target().map(|t| t == refname))
            .unwrap_or(false)
    }
}

fn oid(id: &ObjectId) -> Result<Oid> {
    Ok(Oid::from_str(id.as_str())?)
}

impl RepositoryStore for LocalStore {
    fn describe(&self) -> String {
        self.repo.path().display().to_string()
    }

    fn default_branch(&self) -> Result<String> {
        let head = self.repo.find_reference("HEAD")?;
        let branch = head
            .symbolic_target()
            .map(|target| target.strip_prefix("refs/heads/").unwrap_or(target))
            .unwrap_or("main");
        Ok(branch.to_string())
    }

    fn branch_tip(&self, branch: &str) -> Result<Option<BranchTip>> {
        let reference = match self.repo.find_reference(&format!("refs/heads/{branch}")) {
            Ok(r) => r,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let commit = reference.peel_to_commit()?;
        Ok(Some(BranchTip {
            commit: commit.id().into(),
            tree: commit.tree_id().into(),
        }))
    }

    fn list_paths(&self, tree: &ObjectId) -> Result<Vec<String>> {
        let tree = self.repo.find_tree(oid(tree)?)?;
        let mut paths = Vec::new();

        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob)
                && let Some(name) = entry.name()
            {
                paths.push(format!("{root}{name}"));
            }
            TreeWalkResult::Ok
        })?;

        Ok(paths)
    }

    fn history(&self, from: &ObjectId, page: usize, per_page: usize) -> Result<Vec<CommitRecord>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(oid(from)?)?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        revwalk
            .skip(page * per_page)
            .take(per_page)
            .map(|oid_result| {
                let commit = self.repo.find_commit(oid_result?)?;
                Ok(CommitRecord {
                    id: commit.id().into(),
                    message: commit.message().unwrap_or("").to_string(),
                    time: commit.time().seconds(),
                })
            })
            .collect()
    }

    fn create_tree(&self, base: Option<&ObjectId>, entries: &[TreeEntry]) -> Result<ObjectId> {
        let baseline = match base {
            Some(id) => self.repo.find_tree(oid(id)?)?,
            None => {
                let empty = self.repo.treebuilder(None)?.write()?;
                self.repo.find_tree(empty)?
            }
        };

        let mut update = TreeUpdateBuilder::new();
        for entry in entries {
            validate_path(&entry.path)?;
            let blob = self.repo.blob(&entry.content)?;
            update.upsert(entry.path.as_str(), blob, entry.mode.into());
        }

        let id = update.create_updated(&self.repo, &baseline)?;
        tracing::debug!(tree = %id, entries = entries.len(), "created tree");
        Ok(id.into())
    }

    fn create_commit(
        &self,
        tree: &ObjectId,
        parents: &[ObjectId],
        message: &str,
    ) -> Result<ObjectId> {
        let tree = self.repo.find_tree(oid(tree)?)?;
        let parents = parents
            .iter()
            .map(|p| self.find_commit(p))
            .collect::<Result<Vec<_>>>()?;
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();

        let signature = Signature::now(&self.author_name, &self.author_email)?;
        let id = self
            .repo
            .commit(None, &signature, &signature, message, &tree, &parent_refs)?;

        tracing::debug!(commit = %id, parents = parents.len(), "created commit");
        Ok(id.into())
    }

    fn update_branch(
        &self,
        branch: &str,
        new: &ObjectId,
        expected: Option<&ObjectId>,
        force: bool,
    ) -> Result<()> {
        let refname = format!("refs/heads/{branch}");
        let target = oid(new)?;
        let log_message = format!("leetsync: advance {branch} to {}", new.short());
        let follow_worktree = !self.repo.is_bare() && self.head_points_at(&refname);
        let dirty = follow_worktree && self.has_uncommitted_changes()?;

        let result = match (force, expected) {
            (true, _) => self.repo.reference(&refname, target, true, &log_message),
            (false, Some(current)) => {
                self.repo
                    .reference_matching(&refname, target, true, oid(current)?, &log_message)
            }
            (false, None) => self.repo.reference(&refname, target, false, &log_message),
        };

        match result {
            Ok(_) => {}
            Err(e)
                if matches!(
                    e.code(),
                    ErrorCode::Modified | ErrorCode::Exists | ErrorCode::NotFound
                ) =>
            {
                return Err(Error::RefConflict {
                    branch: branch.to_string(),
                    expected: expected
                        .map(|id| id.short().to_string())
                        .unwrap_or_else(|| "no branch".into()),
                    message: e.message().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        if dirty {
            tracing::warn!(
                branch,
                commit = %new.short(),
                "working tree has uncommitted changes, not checking out the new commit"
            );
        } else if follow_worktree {
            self.repo
                .checkout_head(Some(CheckoutBuilder::default().force()))?;
        }

        Ok(())
    }
}
