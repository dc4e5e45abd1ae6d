//! Credential checking configuration for the password grant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which credential validator backs `/token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
    /// Accept every username/password pair. Development only.
    #[default]
    AcceptAll,
    /// Check against the `users` map of Argon2 hashes.
    Static,
}

/// Credential validator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub mode: CredentialMode,

    /// Users keyed by username.
    #[serde(default)]
    pub users: BTreeMap<String, UserEntry>,
}

/// A single statically configured user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    /// Argon2 password hash in PHC string format.
    pub password_hash: String,

    /// Scopes this user may request. `None` means any declared scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_scopes: Option<Vec<String>>,
}
