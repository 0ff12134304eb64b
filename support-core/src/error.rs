use ticket_registry::ValidationErrors;

/// Every fallible operation in the client returns `Result<T, SupportError>`.
#[derive(Debug, thiserror::Error)]
pub enum SupportError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status. `message` is the server's `error` text when it
    /// sent one.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Application-level failure carried inside a successful response.
    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("AI agent is disconnected")]
    AgentDisconnected,

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("ticket {0} not found")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SupportError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SupportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
