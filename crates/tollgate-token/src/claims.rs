//! Token claims.

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Claim names set by the issuer. Callers cannot supply them as extra claims.
pub const RESERVED_CLAIMS: &[&str] = &["issuer", "username", "scopes", "expires_at"];

/// The full set of claims carried by a signed token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Application that signed the token.
    #[serde(default)]
    pub issuer: String,

    /// Authenticated subject.
    #[serde(default)]
    pub username: String,

    /// Granted scopes, in the order they were requested.
    #[serde(default, with = "space_separated")]
    pub scopes: Vec<String>,

    /// Unix timestamp (seconds) after which the token is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    /// Any other claims supplied at issuance.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ClaimSet {
    /// Check expiry and issuer against the current time and application name.
    pub fn validate(&self, app_name: &str, now: i64) -> Result<(), TokenError> {
        let expires_at = self.expires_at.ok_or(TokenError::MissingExpiry)?;
        if expires_at <= now {
            return Err(TokenError::Expired {
                expired_at: expires_at,
            });
        }
        if self.issuer != app_name {
            return Err(TokenError::IssuerMismatch {
                expected: app_name.to_string(),
                found: self.issuer.clone(),
            });
        }
        Ok(())
    }

    /// Whether the token grants the given scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Caller-controlled part of a claim set, handed to the issuer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectClaims {
    pub username: String,
    pub scopes: Vec<String>,
    pub extra: BTreeMap<String, Value>,
}

impl SubjectClaims {
    /// Claims for a subject with no scopes.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            scopes: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Add a granted scope.
    pub fn add_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Add several granted scopes.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Add an extra claim.
    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub(crate) fn check(&self) -> Result<(), TokenError> {
        if let Some(key) = self
            .extra
            .keys()
            .find(|k| RESERVED_CLAIMS.contains(&k.as_str()))
        {
            return Err(TokenError::ReservedClaim(key.clone()));
        }
        if let Some(scope) = self
            .scopes
            .iter()
            .find(|s| s.is_empty() || s.chars().any(char::is_whitespace))
        {
            return Err(TokenError::InvalidScope(scope.clone()));
        }
        Ok(())
    }
}

/// Scopes travel as one space-separated string. A JSON array is accepted on
/// input as well.
mod space_separated {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(scopes: &[String], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&scopes.join(" "))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Joined(String),
            List(Vec<String>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Joined(s) => s.split_whitespace().map(str::to_string).collect(),
            Repr::List(list) => list,
        })
    }
}
