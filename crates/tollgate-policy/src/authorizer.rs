//! Bearer token authorization against required scopes.

use crate::policy::{AnyOf, ScopePolicy};
use crate::scope::ScopeSet;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tollgate_token::{TokenError, TokenVerifier, VerifiedToken};

/// Outcome of an authorization check.
#[derive(Debug)]
pub enum Decision {
    Allow(VerifiedToken),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn into_result(self) -> Result<VerifiedToken, DenyReason> {
        match self {
            Decision::Allow(token) => Ok(token),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Error)]
pub enum DenyReason {
    /// The token is malformed, badly signed, expired, or from another issuer.
    /// Maps to 401.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    /// The token is valid but does not carry the required scopes. Maps to 403.
    #[error("insufficient scope: requires {required}")]
    InsufficientScope {
        required: ScopeSet,
        granted: Vec<String>,
    },
}

impl DenyReason {
    /// Short machine-readable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DenyReason::InvalidToken(_) => "invalid_token",
            DenyReason::InsufficientScope { .. } => "insufficient_scope",
        }
    }
}

/// Decides whether a bearer token may access a resource.
///
/// Token validity is always checked first. Only then is the configured
/// [`ScopePolicy`] consulted, and only for a non-empty required set.
#[derive(Clone)]
pub struct ScopeAuthorizer {
    verifier: TokenVerifier,
    policy: Arc<dyn ScopePolicy>,
}

impl fmt::Debug for ScopeAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeAuthorizer")
            .field("verifier", &self.verifier)
            .field("policy", &self.policy.name())
            .finish()
    }
}

impl ScopeAuthorizer {
    /// Create an authorizer using the any-of policy.
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier,
            policy: Arc::new(AnyOf),
        }
    }

    /// Replace the scope policy.
    pub fn with_policy(mut self, policy: impl ScopePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Replace the scope policy with a shared one.
    pub fn with_shared_policy(mut self, policy: Arc<dyn ScopePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Authorize a token against the current time.
    pub fn authorize(&self, token: &str, required: &ScopeSet) -> Decision {
        self.authorize_at(token, required, Utc::now().timestamp())
    }

    /// Authorize a token as of `now` (unix seconds).
    pub fn authorize_at(&self, token: &str, required: &ScopeSet, now: i64) -> Decision {
        let verified = match self.verifier.verify_at(token, now) {
            Ok(verified) => verified,
            Err(err) => {
                tracing::debug!(reason = err.kind(), "Rejected bearer token");
                return Decision::Deny(DenyReason::InvalidToken(err));
            }
        };

        if required.is_empty() || self.policy.permits(verified.scopes(), required) {
            return Decision::Allow(verified);
        }

        tracing::debug!(
            subject = %verified.username(),
            required = %required,
            policy = self.policy.name(),
            "Insufficient scope"
        );
        Decision::Deny(DenyReason::InsufficientScope {
            required: required.clone(),
            granted: verified.claims.scopes,
        })
    }
}
