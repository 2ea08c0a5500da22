//! Error types for leetsync-git

/// Result type for leetsync-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repository operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Rate limit exhausted for {url}")]
    RateLimited { url: String },

    #[error("Repository rejected credentials: {message}")]
    Unauthorized { message: String },

    #[error("Repository '{repository}' not found")]
    RepositoryNotFound { repository: String },

    #[error("Branch '{name}' not found")]
    BranchNotFound { name: String },

    #[error("Branch '{branch}' moved concurrently (expected {expected}): {message}")]
    RefConflict {
        branch: String,
        expected: String,
        message: String,
    },

    #[error("Invalid repository path: '{path}'")]
    InvalidPath { path: String },

    #[error("Malformed repository response: {message}")]
    Schema { message: String },
}

impl Error {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::RateLimited { .. } => true,
            Self::Git(e) => matches!(e.class(), git2::ErrorClass::Net | git2::ErrorClass::Http),
            _ => false,
        }
    }
}
