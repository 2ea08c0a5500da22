//! Linear commit chain on the target branch
//!
//! Every unit of work becomes one tree layered on the tree of the previous
//! unit and one commit whose only parent is the previous unit's commit.
//! The held [`CommitChainState`] is replaced after each successful unit, so
//! the next tree is never built from a stale base.

use std::cell::Cell;

use leetsync_git::{BranchTip, ObjectId, RepositoryStore, TreeEntry};

use crate::Result;
use crate::artifact::SolutionArtifact;
use crate::retry::RetryPolicy;

/// Tip of the branch as advanced by this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitChainState {
    /// Commit the next commit is chained on; `None` for an unborn branch
    pub parent: Option<ObjectId>,
    /// Tree the next tree is layered on
    pub base_tree: Option<ObjectId>,
}

impl CommitChainState {
    pub fn from_tip(tip: Option<&BranchTip>) -> Self {
        match tip {
            Some(tip) => Self {
                parent: Some(tip.commit.clone()),
                base_tree: Some(tip.tree.clone()),
            },
            None => Self::default(),
        }
    }
}

/// Files and message of one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitUnit {
    pub artifacts: Vec<SolutionArtifact>,
    pub message: String,
}

/// Tree and commit objects written but not yet on the branch.
struct Committing {
    tree: ObjectId,
    commit: ObjectId,
}

/// Advances one branch, one unit at a time.
pub struct CommitChain<'a, S> {
    store: &'a S,
    branch: String,
    force: bool,
    retry: &'a RetryPolicy,
}

impl<'a, S: RepositoryStore> CommitChain<'a, S> {
    pub fn new(
        store: &'a S,
        branch: impl Into<String>,
        force: bool,
        retry: &'a RetryPolicy,
    ) -> Self {
        Self {
            store,
            branch: branch.into(),
            force,
            retry,
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Commit `unit` on top of `state` and move the branch to it.
    ///
    /// Returns the state to use for the next unit. If the branch no longer
    /// points at `state.parent` the update is rejected with a ref conflict,
    /// unless the chain was created with `force`.
    pub fn apply(&self, state: &CommitChainState, unit: &CommitUnit) -> Result<CommitChainState> {
        let pending = self.begin(state, unit)?;
        self.finish(state, pending)
    }

    fn begin(&self, state: &CommitChainState, unit: &CommitUnit) -> Result<Committing> {
        let entries: Vec<TreeEntry> = unit
            .artifacts
            .iter()
            .map(SolutionArtifact::to_tree_entry)
            .collect();

        let tree = self.retry.retry("create tree", || {
            self.store.create_tree(state.base_tree.as_ref(), &entries)
        })?;
        let parents: Vec<ObjectId> = state.parent.iter().cloned().collect();
        let commit = self.retry.retry("create commit", || {
            self.store.create_commit(&tree, &parents, &unit.message)
        })?;

        tracing::debug!(tree = %tree.short(), commit = %commit.short(), "created commit object");
        Ok(Committing { tree, commit })
    }

    fn finish(&self, state: &CommitChainState, pending: Committing) -> Result<CommitChainState> {
        let attempts = Cell::new(0u32);
        let updated = self.retry.retry("update branch", || {
            attempts.set(attempts.get() + 1);
            self.store
                .update_branch(&self.branch, &pending.commit, state.parent.as_ref(), self.force)
        });

        match updated {
            Ok(()) => {}
            // An earlier attempt may have landed before its response was lost.
            Err(err) if err.is_ref_conflict() && attempts.get() > 1 => {
                let tip = self
                    .retry
                    .retry("read branch tip", || self.store.branch_tip(&self.branch))?;
                if tip.is_none_or(|tip| tip.commit != pending.commit) {
                    return Err(err);
                }
            }
            Err(err) => return Err(err),
        }

        tracing::info!(
            branch = %self.branch,
            commit = %pending.commit.short(),
            "advanced branch"
        );
        Ok(CommitChainState {
            parent: Some(pending.commit),
            base_tree: Some(pending.tree),
        })
    }
}
