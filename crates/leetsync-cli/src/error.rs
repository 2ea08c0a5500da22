//! Error types for leetsync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that end the process with a non-zero exit code
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from the sync engine
    #[error(transparent)]
    Core(#[from] leetsync_core::Error),

    /// Error while setting up the judge client
    #[error(transparent)]
    Judge(#[from] leetsync_judge::Error),

    /// Error while opening the target repository
    #[error(transparent)]
    Git(#[from] leetsync_git::Error),

    /// Log output could not be set up
    #[error("Failed to initialise logging: {message}")]
    Logging { message: String },
}
