//! Error types for delegated sessions.

use thiserror::Error;

/// Errors raised by the session flow and the downstream caller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session record exists for the request.
    #[error("not logged in")]
    NotLoggedIn,

    /// The authorization callback's `state` is missing, forged, or stale.
    #[error("invalid authorization state: {0}")]
    InvalidState(String),

    /// The identity provider refused the authorization or the code exchange.
    #[error("identity provider error: {error}")]
    UpstreamAuth {
        error: String,
        description: Option<String>,
    },

    /// The downstream API answered with a non-success status.
    #[error("upstream returned HTTP {status}")]
    UpstreamHttp { status: u16, body: String },

    /// An outbound request exceeded its timeout.
    #[error("upstream request timed out")]
    UpstreamTimeout,

    /// An outbound request failed before a response arrived.
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// An upstream response could not be understood.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    /// A session cookie or state value could not be produced.
    #[error("signing error: {0}")]
    Signing(String),

    /// The session store failed.
    #[error("session store error: {0}")]
    Store(String),
}

impl SessionError {
    /// Short machine-readable name, used in logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::NotLoggedIn => "not_logged_in",
            SessionError::InvalidState(_) => "invalid_state",
            SessionError::UpstreamAuth { .. } => "upstream_auth_error",
            SessionError::UpstreamHttp { .. } => "upstream_http_error",
            SessionError::UpstreamTimeout => "upstream_timeout",
            SessionError::Transport(_) => "upstream_transport_error",
            SessionError::InvalidResponse(_) => "invalid_upstream_response",
            SessionError::Signing(_) => "signing_error",
            SessionError::Store(_) => "session_store_error",
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SessionError::UpstreamTimeout
        } else {
            SessionError::Transport(err.to_string())
        }
    }
}
