//! Tollgate authorization.
//!
//! Two independent questions are answered here:
//!
//! 1. *Is this username/password pair acceptable?* See [`CredentialValidator`].
//! 2. *Does this bearer token grant access to a resource?* See [`ScopeAuthorizer`].
//!
//! Scope matching is pluggable through [`ScopePolicy`]. The default is
//! [`AnyOf`]: a token needs at least one of the resource's required scopes.

pub mod authorizer;
pub mod credentials;
pub mod policy;
pub mod scope;

pub use authorizer::{Decision, DenyReason, ScopeAuthorizer};
pub use credentials::{
    AcceptAllCredentials, CredentialError, CredentialValidator, StaticCredentials, hash_password,
    validator_from_config,
};
pub use policy::{AllOf, AnyOf, ScopePolicy, policy_for};
pub use scope::ScopeSet;
