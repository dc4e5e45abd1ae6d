//! Error types for the token crate.

use thiserror::Error;

/// Errors that can occur while issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token could not be parsed (bad segments, base64, JSON, or claim types).
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature did not verify, or the header names an algorithm other than HS256.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's `expires_at` is not in the future.
    #[error("token expired at {expired_at}")]
    Expired { expired_at: i64 },

    /// The token carries no `expires_at` claim.
    #[error("token has no expiry")]
    MissingExpiry,

    /// The token was signed for a different application.
    #[error("token issuer '{found}' does not match '{expected}'")]
    IssuerMismatch { expected: String, found: String },

    /// A token lifetime of less than one second was requested.
    #[error("token lifetime must be at least one second")]
    InvalidTtl,

    /// A caller-supplied claim collides with a claim the issuer controls.
    #[error("claim '{0}' is reserved")]
    ReservedClaim(String),

    /// A scope is empty or contains whitespace.
    #[error("invalid scope '{0}'")]
    InvalidScope(String),

    /// The signing secret is unusable.
    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),

    /// Signing failed.
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// IO error (reading/writing secrets).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TokenError {
    /// Short machine-readable name, used in logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired { .. } => "expired",
            TokenError::MissingExpiry => "missing_expiry",
            TokenError::IssuerMismatch { .. } => "issuer_mismatch",
            TokenError::InvalidTtl => "invalid_ttl",
            TokenError::ReservedClaim(_) => "reserved_claim",
            TokenError::InvalidScope(_) => "invalid_scope",
            TokenError::InvalidSecret(_) => "invalid_secret",
            TokenError::Encoding(_) => "encoding",
            TokenError::Io(_) => "io",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            ErrorKind::InvalidKeyFormat => TokenError::InvalidSecret(err.to_string()),
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}
