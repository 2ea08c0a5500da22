//! Sync run orchestration
//!
//! One run: recover the marker from history, fetch what the judge has
//! accepted since, drop duplicates, then resolve content, names and commits
//! submission by submission, oldest first.

use leetsync_git::{ObjectId, RepositoryStore};
use leetsync_judge::{JudgeApi, Submission};

use crate::Result;
use crate::artifact::{SolutionArtifact, render_description};
use crate::chain::{CommitChain, CommitChainState, CommitUnit};
use crate::config::SyncSettings;
use crate::content::{ContentResolver, Resolution};
use crate::dedup::dedup;
use crate::marker::{SyncMarker, recover_marker};
use crate::message::{CommitEntry, compose};
use crate::naming::{NameResolver, SolutionIndex};
use crate::retry::RetryPolicy;
use crate::source::SubmissionSource;

/// Per-run options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Plan names, indices and messages without writing anything
    pub dry_run: bool,
}

/// A solution written (or, in a dry run, planned) by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSolution {
    pub submission_id: String,
    pub title: String,
    pub folder: String,
    pub file_name: String,
    pub timestamp: i64,
    /// Commit holding the solution; `None` in a dry run
    pub commit: Option<ObjectId>,
}

impl CommittedSolution {
    pub fn path(&self) -> String {
        format!("{}/{}", self.folder, self.file_name)
    }
}

/// A submission the run passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSubmission {
    pub submission_id: String,
    pub title: String,
    pub reason: String,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub branch: String,
    pub dry_run: bool,
    pub marker_before: SyncMarker,
    pub marker_after: SyncMarker,
    pub committed: Vec<CommittedSolution>,
    pub skipped: Vec<SkippedSubmission>,
    pub already_synced: usize,
    pub duplicates_dropped: usize,
    /// New commits, oldest first
    pub commits: Vec<ObjectId>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.committed.is_empty()
    }
}

/// One resolved submission waiting for its commit.
struct Planned {
    artifacts: Vec<SolutionArtifact>,
    entry: CommitEntry,
    solution: CommittedSolution,
}

/// Drives a sync run against one judge and one repository.
pub struct SyncCoordinator<J, S> {
    judge: J,
    store: S,
    settings: SyncSettings,
    retry: RetryPolicy,
    branch: Option<String>,
}

impl<J: JudgeApi, S: RepositoryStore> SyncCoordinator<J, S> {
    pub fn new(judge: J, store: S, settings: SyncSettings, retry: RetryPolicy) -> Self {
        Self {
            judge,
            store,
            settings,
            retry,
            branch: None,
        }
    }

    /// Sync into `branch` instead of the store's default branch.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    fn target_branch(&self) -> Result<String> {
        match &self.branch {
            Some(branch) => Ok(branch.clone()),
            None => self
                .retry
                .retry("read default branch", || self.store.default_branch()),
        }
    }

    /// Marker recovered from the target branch's history.
    pub fn current_marker(&self) -> Result<SyncMarker> {
        let branch = self.target_branch()?;
        let tip = self
            .retry
            .retry("read branch tip", || self.store.branch_tip(&branch))?;
        recover_marker(&self.store, tip.as_ref(), &self.retry)
    }

    /// Run one sync.
    ///
    /// Submissions whose content is unavailable are skipped and reported.
    /// Any other failure aborts the run, leaving the branch at the last
    /// commit this run completed.
    pub fn run(&self, options: &SyncOptions) -> Result<SyncReport> {
        let branch = self.target_branch()?;
        let tip = self
            .retry
            .retry("read branch tip", || self.store.branch_tip(&branch))?;
        let marker = recover_marker(&self.store, tip.as_ref(), &self.retry)?;

        tracing::info!(
            target = %self.store.describe(),
            branch = %branch,
            marker = %marker,
            dry_run = options.dry_run,
            "starting sync"
        );

        let source = SubmissionSource::new(
            &self.judge,
            &self.retry,
            self.settings.page_size,
            self.settings.page_delay,
        );
        let fetched = source.fetch_accepted(&marker).collect::<Result<Vec<Submission>>>()?;
        let outcome = dedup(fetched, self.settings.dedup_window_secs, &marker);
        tracing::info!(
            new = outcome.kept.len(),
            already_synced = outcome.already_synced,
            duplicates = outcome.duplicates.len(),
            "fetched accepted submissions"
        );

        let existing = match &tip {
            Some(tip) => self
                .retry
                .retry("list repository files", || self.store.list_paths(&tip.tree))?,
            None => Vec::new(),
        };
        let mut names = NameResolver::new(
            self.settings.numbered_folders,
            SolutionIndex::from_paths(existing),
        );
        let mut content =
            ContentResolver::new(&self.judge, &self.retry, self.settings.locked_content);
        let chain = CommitChain::new(
            &self.store,
            branch.clone(),
            self.settings.force_update,
            &self.retry,
        );
        let mut state = CommitChainState::from_tip(tip.as_ref());

        let mut report = SyncReport {
            branch,
            dry_run: options.dry_run,
            marker_before: marker.clone(),
            marker_after: marker,
            committed: Vec::new(),
            skipped: Vec::new(),
            already_synced: outcome.already_synced,
            duplicates_dropped: outcome.duplicates.len(),
            commits: Vec::new(),
        };

        let batch_size = self.settings.batch_size.max(1);
        let mut batch: Vec<Planned> = Vec::with_capacity(batch_size);

        for submission in &outcome.kept {
            let resolved = match content.resolve(submission)? {
                Resolution::Resolved(resolved) => resolved,
                Resolution::Unavailable { reason } => {
                    tracing::warn!(
                        submission = %submission.id,
                        title = %submission.title,
                        %reason,
                        "skipping submission"
                    );
                    report.skipped.push(SkippedSubmission {
                        submission_id: submission.id.clone(),
                        title: submission.title.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let identity = names.resolve_identity(submission, resolved.problem_id.as_deref());
            let mut artifacts = Vec::with_capacity(2);
            if names.claim_description(&identity) {
                artifacts.push(SolutionArtifact::description(
                    &identity,
                    render_description(submission, resolved.problem.as_ref()),
                ));
            }
            artifacts.push(SolutionArtifact::solution(&identity, &resolved.code));

            batch.push(Planned {
                artifacts,
                entry: CommitEntry {
                    path: identity.solution_path(),
                    submission_id: submission.id.clone(),
                    timestamp: submission.timestamp,
                    runtime: submission.runtime.clone(),
                    memory: submission.memory.clone(),
                    runtime_percentile: resolved.runtime_percentile,
                    memory_percentile: resolved.memory_percentile,
                },
                solution: CommittedSolution {
                    submission_id: submission.id.clone(),
                    title: submission.title.clone(),
                    folder: identity.folder.clone(),
                    file_name: identity.file_name(),
                    timestamp: submission.timestamp,
                    commit: None,
                },
            });

            if batch.len() >= batch_size {
                state = self.flush(&chain, state, &mut batch, &mut report, options)?;
            }
        }
        if !batch.is_empty() {
            self.flush(&chain, state, &mut batch, &mut report, options)?;
        }

        tracing::info!(
            committed = report.committed.len(),
            skipped = report.skipped.len(),
            commits = report.commits.len(),
            marker = %report.marker_after,
            "sync finished"
        );
        Ok(report)
    }

    fn flush(
        &self,
        chain: &CommitChain<'_, S>,
        state: CommitChainState,
        batch: &mut Vec<Planned>,
        report: &mut SyncReport,
        options: &SyncOptions,
    ) -> Result<CommitChainState> {
        let planned = std::mem::take(batch);
        let entries: Vec<CommitEntry> = planned.iter().map(|p| p.entry.clone()).collect();
        let unit = CommitUnit {
            artifacts: planned.iter().flat_map(|p| p.artifacts.iter().cloned()).collect(),
            message: compose(&entries),
        };

        let (state, commit) = if options.dry_run {
            (state, None)
        } else {
            let next = chain.apply(&state, &unit)?;
            let commit = next.parent.clone();
            (next, commit)
        };
        if let Some(commit) = &commit {
            report.commits.push(commit.clone());
        }

        for Planned { entry, mut solution, .. } in planned {
            tracing::info!(
                folder = %solution.folder,
                file = %solution.file_name,
                submission = %solution.submission_id,
                "synced solution"
            );
            report.marker_after.advance(entry.timestamp, &entry.submission_id);
            solution.commit = commit.clone();
            report.committed.push(solution);
        }
        Ok(state)
    }
}
