//! Error types for the HTTP surface.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tollgate_policy::{CredentialError, DenyReason, ScopeSet};
use tollgate_session::SessionError;
use tollgate_token::TokenError;

/// Errors returned to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Username/password rejected at `/token`.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No bearer token on a protected route.
    #[error("Not authenticated")]
    MissingToken,

    /// Bearer token failed verification.
    #[error("Could not validate credentials")]
    InvalidToken(#[source] TokenError),

    /// Bearer token lacks the required scopes.
    #[error("Insufficient permissions")]
    InsufficientScope { required: ScopeSet },

    /// No live delegated session.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Request is missing fields or malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// A requested scope is unknown or not grantable.
    #[error("scope '{0}' cannot be granted")]
    InvalidScope(String),

    /// Authorization callback carried a bad `state`.
    #[error("invalid authorization state")]
    InvalidState,

    /// The identity provider rejected the login.
    #[error("{}", upstream_auth_message(.error, .description))]
    UpstreamAuth {
        error: String,
        description: Option<String>,
    },

    /// The resource API answered with an error status, passed through as-is.
    #[error("upstream returned HTTP {status}")]
    UpstreamHttp { status: u16 },

    /// An upstream call exceeded its timeout.
    #[error("upstream request timed out")]
    UpstreamTimeout,

    /// An upstream call failed or returned something unusable.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// The credential store could not be reached.
    #[error("credential store unavailable")]
    CredentialStoreUnavailable,

    /// Internal error.
    #[error("internal error")]
    Internal(String),
}

fn upstream_auth_message(error: &str, description: &Option<String>) -> String {
    match description {
        Some(d) => format!("{error}: {d}"),
        None => error.to_string(),
    }
}

impl ApiError {
    /// Short machine-readable name for the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::MissingToken | ApiError::InvalidToken(_) => "invalid_token",
            ApiError::InsufficientScope { .. } => "insufficient_scope",
            ApiError::NotLoggedIn => "not_logged_in",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::InvalidScope(_) => "invalid_scope",
            ApiError::InvalidState => "invalid_state",
            ApiError::UpstreamAuth { .. } => "upstream_auth_error",
            ApiError::UpstreamHttp { .. } => "upstream_http_error",
            ApiError::UpstreamTimeout => "upstream_timeout",
            ApiError::BadGateway(_) => "bad_gateway",
            ApiError::CredentialStoreUnavailable => "temporarily_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials
            | ApiError::MissingToken
            | ApiError::InvalidToken(_)
            | ApiError::NotLoggedIn => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientScope { .. } => StatusCode::FORBIDDEN,
            ApiError::InvalidRequest(_) | ApiError::InvalidScope(_) | ApiError::InvalidState => {
                StatusCode::BAD_REQUEST
            }
            ApiError::UpstreamAuth { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::UpstreamHttp { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::CredentialStoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Replace provider error text with a generic message.
    pub fn redact_upstream(self) -> Self {
        match self {
            ApiError::UpstreamAuth { .. } => ApiError::UpstreamAuth {
                error: "authorization with the identity provider failed".to_string(),
                description: None,
            },
            other => other,
        }
    }

    fn www_authenticate(&self) -> Option<String> {
        match self {
            ApiError::MissingToken => Some("Bearer".to_string()),
            ApiError::InvalidToken(err) => Some(format!(
                r#"Bearer error="invalid_token", error_description="{}""#,
                err.kind()
            )),
            ApiError::InsufficientScope { required } => Some(format!(
                r#"Bearer error="insufficient_scope", scope="{}""#,
                required
            )),
            _ => None,
        }
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::InvalidToken(err) => ApiError::InvalidToken(err),
            DenyReason::InsufficientScope { required, .. } => {
                ApiError::InsufficientScope { required }
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotLoggedIn => ApiError::NotLoggedIn,
            SessionError::InvalidState(_) => ApiError::InvalidState,
            SessionError::UpstreamAuth { error, description } => {
                ApiError::UpstreamAuth { error, description }
            }
            SessionError::UpstreamHttp { status, .. } => ApiError::UpstreamHttp { status },
            SessionError::UpstreamTimeout => ApiError::UpstreamTimeout,
            SessionError::Transport(msg) | SessionError::InvalidResponse(msg) => {
                ApiError::BadGateway(msg)
            }
            SessionError::Signing(msg) | SessionError::Store(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::StoreUnavailable(msg) => {
                tracing::warn!(error = %msg, "Credential store unavailable");
                ApiError::CredentialStoreUnavailable
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(detail) => tracing::error!(error = %detail, "Request failed"),
            ApiError::UpstreamAuth { .. }
            | ApiError::UpstreamHttp { .. }
            | ApiError::UpstreamTimeout
            | ApiError::BadGateway(_) => {
                tracing::warn!(kind = self.kind(), error = %self, "Upstream failure")
            }
            _ => tracing::debug!(kind = self.kind(), status = status.as_u16(), "Request denied"),
        }

        let mut response = (
            status,
            Json(json!({ "error": self.kind(), "message": self.to_string() })),
        )
            .into_response();

        if let Some(challenge) = self.www_authenticate() {
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidToken(TokenError::InvalidSignature).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InsufficientScope {
                required: ScopeSet::new(["a"])
            }
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::NotLoggedIn.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::UpstreamHttp { status: 404 }.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::CredentialStoreUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_insufficient_scope_challenge() {
        let response = ApiError::InsufficientScope {
            required: ScopeSet::new(["some.scope", "third.scope"]),
        }
        .into_response();
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            r#"Bearer error="insufficient_scope", scope="some.scope third.scope""#
        );
    }

    #[test]
    fn test_upstream_auth_redaction() {
        let err = ApiError::from(SessionError::UpstreamAuth {
            error: "access_denied".into(),
            description: Some("user said no".into()),
        });
        assert_eq!(err.to_string(), "access_denied: user said no");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let redacted = err.redact_upstream();
        assert!(!redacted.to_string().contains("user said no"));
    }
}
