//! Protected resource declarations.

use serde::{Deserialize, Serialize};

/// How a resource's required scopes are matched against a token's scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// At least one required scope must be granted.
    #[default]
    AnyOf,
    /// Every required scope must be granted.
    AllOf,
}

/// A protected GET endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Route path, e.g. `/endpoint1`.
    pub path: String,

    /// Required scopes. Empty means any valid token is accepted.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Scope matching policy.
    #[serde(default)]
    pub policy: PolicyKind,

    /// JSON body returned on success. A small default body is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}
