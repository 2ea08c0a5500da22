//! Commit message convention
//!
//! Sync commits carry a `Runtime: <value>, Memory: <value>` line per
//! solution plus `Submission-Id` / `Submission-Timestamp` trailers for the
//! newest submission they contain. The trailers are what marker recovery
//! reads back. Messages in the older `Time: .., Space: ..` form are still
//! recognised.

use std::sync::LazyLock;

use regex::Regex;

pub const TRAILER_ID: &str = "Submission-Id";
pub const TRAILER_TIMESTAMP: &str = "Submission-Timestamp";

static METRICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Runtime|Time): ([^,\n]+), (?:Memory|Space): ([^\n]+)")
        .expect("metrics pattern is valid")
});

static TIMESTAMP_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Submission-Timestamp:\s*(-?\d+)\s*$").expect("trailer pattern is valid")
});

static ID_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Submission-Id:\s*(\S+)\s*$").expect("trailer pattern is valid")
});

/// One solution recorded in a commit message.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitEntry {
    pub path: String,
    pub submission_id: String,
    pub timestamp: i64,
    pub runtime: String,
    pub memory: String,
    pub runtime_percentile: Option<f64>,
    pub memory_percentile: Option<f64>,
}

impl CommitEntry {
    /// `Runtime: 52 ms (87.30%), Memory: 17.2 MB (45.10%)`
    pub fn metrics(&self) -> String {
        format!(
            "Runtime: {}, Memory: {}",
            with_percentile(&self.runtime, self.runtime_percentile),
            with_percentile(&self.memory, self.memory_percentile)
        )
    }
}

fn with_percentile(value: &str, percentile: Option<f64>) -> String {
    match percentile {
        Some(p) => format!("{value} ({p:.2}%)"),
        None => value.to_string(),
    }
}

/// Compose the message for a commit holding `entries` (oldest first).
pub fn compose(entries: &[CommitEntry]) -> String {
    let mut message = match entries {
        [single] => format!("Add {}\n\n{}\n", single.path, single.metrics()),
        _ => {
            let mut batch = format!("Sync {} solutions\n\n", entries.len());
            for entry in entries {
                batch.push_str(&format!("{} {}\n", entry.path, entry.metrics()));
            }
            batch
        }
    };

    if let Some(newest) = entries.iter().max_by_key(|e| e.timestamp) {
        message.push_str(&format!(
            "\n{TRAILER_ID}: {}\n{TRAILER_TIMESTAMP}: {}\n",
            newest.submission_id, newest.timestamp
        ));
    }
    message
}

/// Metadata recovered from a sync commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub runtime: String,
    pub memory: String,
    pub submission_id: Option<String>,
    pub timestamp: Option<i64>,
}

/// Parse a commit message written by a sync run.
///
/// Returns `None` for commits that do not follow the metrics convention.
pub fn parse(message: &str) -> Option<CommitMetadata> {
    let metrics = METRICS.captures(message)?;

    Some(CommitMetadata {
        runtime: metrics[1].trim().to_string(),
        memory: metrics[2].trim().to_string(),
        submission_id: ID_TRAILER
            .captures(message)
            .map(|caps| caps[1].to_string()),
        timestamp: TIMESTAMP_TRAILER
            .captures(message)
            .and_then(|caps| caps[1].parse().ok()),
    })
}
