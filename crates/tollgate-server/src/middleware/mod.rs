pub mod auth;
pub mod handlers;

pub use auth::{ScopeGuard, VerifiedSession, require_scopes, require_session};
