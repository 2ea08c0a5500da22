//! Error types for leetsync-core

use std::path::PathBuf;

/// Result type for leetsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a sync run.
///
/// Content that the judge no longer serves is not an error; it surfaces as
/// [`crate::content::Resolution::Unavailable`] and only skips a submission.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration value is absent
    #[error("Missing required configuration value: {key}")]
    MissingConfig { key: String },

    /// A configuration value could not be parsed or is out of range
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    /// Configuration file could not be read or parsed
    #[error("Failed to load config at {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    /// A transient failure kept recurring until the attempt budget ran out
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    // Transparent wrappers for underlying crate errors
    /// Judge query error from leetsync-judge
    #[error(transparent)]
    Judge(#[from] leetsync_judge::Error),

    /// Repository error from leetsync-git
    #[error(transparent)]
    Git(#[from] leetsync_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether the underlying failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Judge(e) => e.is_transient(),
            Self::Git(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether the branch moved underneath the run.
    pub fn is_ref_conflict(&self) -> bool {
        matches!(self, Self::Git(leetsync_git::Error::RefConflict { .. }))
    }
}
