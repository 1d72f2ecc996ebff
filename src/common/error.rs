use thiserror::Error;

/// Everything the client layer can surface to a view
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid credentials or an expired/invalid token
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Login refused because the account is blocked; routed to the appeal flow
    #[error("account is blocked (blocked {block_count} times)")]
    Blocked { block_count: u32 },

    /// The profile or post looked up does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success answer from a service
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("session store error: {0}")]
    Store(String),

    /// The action needs a signed-in session
    #[error("not signed in")]
    Unauthenticated,

    /// Signed in, but the account may not do this
    #[error("not allowed: {0}")]
    Forbidden(String),
}

impl ClientError {
    /// Errors that end the session locally
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Auth(_) | ClientError::Unauthenticated)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
