//! Last-synced marker
//!
//! The marker is not stored anywhere on its own; it is read back from the
//! newest commit on the target branch that follows the message convention
//! in [`crate::message`].

use std::fmt;

use chrono::{TimeZone, Utc};
use leetsync_git::{BranchTip, RepositoryStore};
use leetsync_judge::Submission;

use crate::Result;
use crate::message;
use crate::retry::RetryPolicy;

const HISTORY_PAGE_SIZE: usize = 100;

/// Boundary at or below which submissions count as already synced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMarker {
    /// Acceptance time of the last synced submission (Unix seconds)
    pub timestamp: i64,
    pub submission_id: Option<String>,
}

impl SyncMarker {
    /// Marker of a repository that has never been synced.
    pub fn epoch() -> Self {
        Self::default()
    }

    pub fn is_epoch(&self) -> bool {
        self.timestamp == 0 && self.submission_id.is_none()
    }

    /// Whether `submission` is at or before this marker.
    pub fn covers(&self, submission: &Submission) -> bool {
        submission.timestamp <= self.timestamp
    }

    /// Move forward to `timestamp`. Never moves backwards.
    pub fn advance(&mut self, timestamp: i64, submission_id: &str) {
        if timestamp > self.timestamp {
            self.timestamp = timestamp;
            self.submission_id = Some(submission_id.to_string());
        }
    }
}

impl fmt::Display for SyncMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_epoch() {
            return f.write_str("epoch (nothing synced yet)");
        }
        let when = Utc
            .timestamp_opt(self.timestamp, 0)
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| self.timestamp.to_string());
        match &self.submission_id {
            Some(id) => write!(f, "{when} (submission {id})"),
            None => write!(f, "{when}"),
        }
    }
}

/// Recover the marker from the history behind `tip`.
///
/// Walks history newest first and stops at the first sync commit. A sync
/// commit without a timestamp trailer (older message format) contributes
/// its commit time instead. Without any sync commit the marker is the epoch.
pub fn recover_marker<S: RepositoryStore>(
    store: &S,
    tip: Option<&BranchTip>,
    retry: &RetryPolicy,
) -> Result<SyncMarker> {
    let Some(tip) = tip else {
        return Ok(SyncMarker::epoch());
    };

    for page in 0.. {
        let commits = retry.retry("read commit history", || {
            store.history(&tip.commit, page, HISTORY_PAGE_SIZE)
        })?;
        if commits.is_empty() {
            break;
        }

        for commit in &commits {
            let Some(metadata) = message::parse(&commit.message) else {
                continue;
            };
            let marker = match metadata.timestamp {
                Some(timestamp) => SyncMarker {
                    timestamp,
                    submission_id: metadata.submission_id,
                },
                None => SyncMarker {
                    timestamp: commit.time,
                    submission_id: metadata.submission_id,
                },
            };
            tracing::debug!(commit = %commit.id.short(), %marker, "recovered sync marker");
            return Ok(marker);
        }

        if commits.len() < HISTORY_PAGE_SIZE {
            break;
        }
    }

    Ok(SyncMarker::epoch())
}
