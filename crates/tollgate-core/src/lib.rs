//! Shared configuration for Tollgate crates.
//!
//! Everything the gateway needs at startup (signing secrets, session cookie
//! settings, the identity provider, the scope catalog and protected resources)
//! is described by a single [`TollgateConfig`], loaded once and then treated as
//! read-only for the life of the process.

pub mod config;

pub use config::{
    ConfigError, CredentialMode, CredentialsConfig, PolicyKind, ProviderConfig, ResourceConfig,
    ServerConfig, SessionConfig, TokenConfig, TollgateConfig, UserEntry,
};
