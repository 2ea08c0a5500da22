//! Dropping already-synced and near-duplicate submissions

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use leetsync_judge::Submission;

use crate::marker::SyncMarker;
use crate::naming::normalize_title;

/// Result of [`dedup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    /// Submissions to sync, oldest first
    pub kept: Vec<Submission>,
    /// Submissions at or before the marker
    pub already_synced: usize,
    /// Repeats of a kept submission, within the window or by id
    pub duplicates: Vec<Submission>,
}

/// Oldest first; ties broken by submission id so the order is total.
pub fn chronological(a: &Submission, b: &Submission) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.id.len().cmp(&b.id.len()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Filter `submissions` down to the ones that need syncing.
///
/// Anything at or before `marker` is dropped with no tolerance. Of the
/// rest, per (normalised title, language) a submission is kept only if it
/// is at least `window_secs` after the last kept one for that key. The
/// same submission id is never kept twice.
///
/// Already-synced submissions still take part in the window, replayed as
/// an earlier run would have seen them, so an acceptance that lands just
/// after a run does not duplicate the one that run committed.
pub fn dedup(
    mut submissions: Vec<Submission>,
    window_secs: i64,
    marker: &SyncMarker,
) -> DedupOutcome {
    submissions.sort_by(chronological);

    let mut outcome = DedupOutcome::default();
    let mut last_kept: HashMap<(String, String), i64> = HashMap::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for submission in submissions {
        let key = (normalize_title(&submission.title), submission.lang.clone());
        let gap = last_kept.get(&key).map(|&previous| submission.timestamp - previous);
        let inside_window = gap.is_some_and(|gap| gap < window_secs);

        if marker.covers(&submission) {
            outcome.already_synced += 1;
            if !inside_window {
                last_kept.insert(key, submission.timestamp);
            }
            continue;
        }
        if seen_ids.contains(&submission.id) {
            outcome.duplicates.push(submission);
            continue;
        }

        if let Some(gap) = gap
            && inside_window
        {
            tracing::debug!(
                submission = %submission.id,
                title = %submission.title,
                seconds_after = gap,
                "dropping duplicate acceptance"
            );
            outcome.duplicates.push(submission);
            continue;
        }

        last_kept.insert(key, submission.timestamp);
        seen_ids.insert(submission.id.clone());
        outcome.kept.push(submission);
    }

    outcome
}
