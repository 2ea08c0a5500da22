//! Incremental synchronization engine for leetsync
//!
//! Turns the stream of accepted submissions reported by a judge into an
//! ordered, deduplicated sequence of commits on a target branch. Re-running
//! a sync with nothing new on the judge side produces no commits.
//!
//! # Pipeline
//!
//! - [`source`]: paginated, paced, retried retrieval of accepted submissions
//! - [`dedup`]: marker and time-window filtering
//! - [`content`]: code and description lookup, tolerant of locked problems
//! - [`naming`]: problem folders and per-language solution numbering
//! - [`chain`]: strictly linear tree-and-commit chaining
//! - [`coordinator`]: drives one run and reports what it did
//!
//! The last-synced marker lives in commit messages; see [`message`] and
//! [`marker`].

pub mod artifact;
pub mod chain;
pub mod config;
pub mod content;
pub mod coordinator;
pub mod dedup;
pub mod error;
pub mod language;
pub mod marker;
pub mod message;
pub mod naming;
pub mod retry;
pub mod source;

pub use artifact::{ArtifactKind, SolutionArtifact};
pub use chain::{CommitChain, CommitChainState, CommitUnit};
pub use config::{Author, Config, FileConfig, LockedContentPolicy, Overrides, SyncSettings, Target};
pub use content::{ContentResolver, Resolution, ResolvedContent};
pub use coordinator::{
    CommittedSolution, SkippedSubmission, SyncCoordinator, SyncOptions, SyncReport,
};
pub use dedup::{DedupOutcome, dedup};
pub use error::{Error, Result};
pub use marker::{SyncMarker, recover_marker};
pub use naming::{Identity, NameResolver, SolutionIndex};
pub use retry::RetryPolicy;
pub use source::SubmissionSource;
