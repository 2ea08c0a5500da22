//! Error types for leetsync-judge

/// Result type for leetsync-judge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while querying the judge
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Judge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Judge rejected the session: {message}")]
    Unauthorized { message: String },

    #[error("Malformed judge response: {message}")]
    Schema { message: String },

    #[error("Judge reported query errors: {messages}")]
    GraphQl { messages: String },
}

impl Error {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts, connection failures, rate limiting and server-side errors
    /// are transient. Everything else (bad credentials, unexpected payloads)
    /// will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Client(_)
            | Self::Unauthorized { .. }
            | Self::Schema { .. }
            | Self::GraphQl { .. } => false,
        }
    }
}
