//! Session identifiers and records.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use crate::error::SessionError;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::fmt;

/// Opaque session identifier: 32 random bytes, base64url encoded.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix safe to put in logs.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}..)", self.short())
    }
}

/// Access token obtained from the identity provider for a user.
#[derive(Clone, PartialEq, Eq)]
pub struct DelegatedCredential {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    /// Provider-reported expiry, if any.
    pub expires_at: Option<DateTime<Utc>>,
}

impl DelegatedCredential {
    /// A bearer credential with no optional fields.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            scope: None,
            expires_at: None,
        }
    }
}

impl fmt::Debug for DelegatedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedCredential")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What the session store keeps per session id.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub credential: DelegatedCredential,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A record created now that lives for `ttl`.
    pub fn new(credential: DelegatedCredential, ttl: Duration) -> Result<Self, SessionError> {
        let created_at = Utc::now();
        let expires_at = created_at.checked_add_signed(ttl).ok_or_else(|| {
            SessionError::Store(format!("session lifetime of {}s is out of range", ttl.num_seconds()))
        })?;
        Ok(Self {
            credential,
            created_at,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique_and_opaque() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert_eq!(a.short().len(), 8);
        assert!(!format!("{:?}", a).contains(a.as_str()));
    }

    #[test]
    fn test_credential_debug_hides_token() {
        let cred = DelegatedCredential::bearer("provider-access-token");
        assert!(!format!("{:?}", cred).contains("provider-access-token"));
    }

    #[test]
    fn test_record_expiry() {
        let record =
            SessionRecord::new(DelegatedCredential::bearer("t"), Duration::seconds(60)).unwrap();
        assert!(!record.is_expired());
        assert!(record.is_expired_at(record.created_at + Duration::seconds(60)));
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let ttl = Duration::seconds(1_000_000_000_000_000);
        assert!(matches!(
            SessionRecord::new(DelegatedCredential::bearer("t"), ttl),
            Err(SessionError::Store(_))
        ));
        assert!(SessionRecord::new(DelegatedCredential::bearer("t"), Duration::MAX).is_err());
    }
}
