//! Username/password validation.

use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tollgate_core::{CredentialMode, CredentialsConfig};

/// Errors from a credential backing store.
///
/// A wrong password is not an error: validators return `Ok(false)` for that.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The backing store could not be reached.
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored password hash could not be parsed.
    #[error("stored password hash for '{username}' is invalid: {reason}")]
    InvalidHash { username: String, reason: String },

    /// Hashing a new password failed.
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// Checks a username/password pair against some backing store.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// `Ok(true)` if the pair is valid, `Ok(false)` if it is not.
    async fn validate(&self, username: &str, password: &str) -> Result<bool, CredentialError>;

    /// Scopes this user may be granted. `None` places no restriction.
    fn grantable_scopes(&self, _username: &str) -> Option<&[String]> {
        None
    }
}

/// Accepts every username/password pair.
///
/// Only for development; a warning is logged on construction.
#[derive(Debug)]
pub struct AcceptAllCredentials;

impl AcceptAllCredentials {
    pub fn new() -> Self {
        tracing::warn!("Credential validation is disabled: every username/password is accepted");
        Self
    }
}

impl Default for AcceptAllCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialValidator for AcceptAllCredentials {
    async fn validate(&self, _username: &str, _password: &str) -> Result<bool, CredentialError> {
        Ok(true)
    }
}

#[derive(Debug, Clone)]
struct StaticUser {
    password_hash: String,
    allowed_scopes: Option<Vec<String>>,
}

/// In-memory users with Argon2 PHC password hashes.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, Arc<StaticUser>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user with an existing PHC hash.
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        allowed_scopes: Option<Vec<String>>,
    ) -> Self {
        self.users.insert(
            username.into(),
            Arc::new(StaticUser {
                password_hash: password_hash.into(),
                allowed_scopes,
            }),
        );
        self
    }

    /// Build from the `credentials.users` config section.
    pub fn from_config(config: &CredentialsConfig) -> Self {
        config
            .users
            .iter()
            .fold(Self::new(), |creds, (name, entry)| {
                creds.with_user(
                    name.clone(),
                    entry.password_hash.clone(),
                    entry.allowed_scopes.clone(),
                )
            })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialValidator for StaticCredentials {
    async fn validate(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let Some(user) = self.users.get(username).cloned() else {
            return Ok(false);
        };

        let username = username.to_string();
        let password = password.to_string();
        // Argon2 verification is CPU-bound.
        tokio::task::spawn_blocking(move || verify_password(&username, &user.password_hash, &password))
            .await
            .map_err(|e| CredentialError::StoreUnavailable(e.to_string()))?
    }

    fn grantable_scopes(&self, username: &str) -> Option<&[String]> {
        self.users
            .get(username)
            .and_then(|u| u.allowed_scopes.as_deref())
    }
}

fn verify_password(username: &str, hash: &str, password: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(hash).map_err(|e| CredentialError::InvalidHash {
        username: username.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash a password into an Argon2 PHC string suitable for `credentials.users`.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

/// Build the validator selected by configuration.
pub fn validator_from_config(config: &CredentialsConfig) -> Arc<dyn CredentialValidator> {
    match config.mode {
        CredentialMode::AcceptAll => Arc::new(AcceptAllCredentials::new()),
        CredentialMode::Static => Arc::new(StaticCredentials::from_config(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::UserEntry;

    #[tokio::test]
    async fn test_accept_all() {
        let validator = AcceptAllCredentials::new();
        assert!(validator.validate("anyone", "anything").await.unwrap());
        assert!(validator.grantable_scopes("anyone").is_none());
    }

    #[tokio::test]
    async fn test_static_credentials() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));

        let creds = StaticCredentials::new().with_user("alice", hash, None);
        assert!(creds.validate("alice", "hunter2").await.unwrap());
        assert!(!creds.validate("alice", "wrong").await.unwrap());
        assert!(!creds.validate("bob", "hunter2").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_stored_hash() {
        let creds = StaticCredentials::new().with_user("alice", "not-a-phc-string", None);
        let err = creds.validate("alice", "x").await.unwrap_err();
        assert!(matches!(err, CredentialError::InvalidHash { username, .. } if username == "alice"));
    }

    #[tokio::test]
    async fn test_from_config_with_scope_allow_list() {
        let mut config = CredentialsConfig {
            mode: CredentialMode::Static,
            ..CredentialsConfig::default()
        };
        config.users.insert(
            "alice".into(),
            UserEntry {
                password_hash: hash_password("pw").unwrap(),
                allowed_scopes: Some(vec!["some.scope".into()]),
            },
        );

        let creds = StaticCredentials::from_config(&config);
        assert_eq!(creds.len(), 1);
        assert_eq!(
            creds.grantable_scopes("alice"),
            Some(&["some.scope".to_string()][..])
        );

        let validator = validator_from_config(&config);
        assert!(validator.validate("alice", "pw").await.unwrap());
        assert!(!validator.validate("alice", "nope").await.unwrap());
    }
}
