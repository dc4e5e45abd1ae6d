//! # tollgate-token
//!
//! Self-issued access tokens for Tollgate.
//!
//! This crate provides functionality for:
//! - Generating and loading the shared signing secret
//! - Encoding and decoding claim sets as HS256-signed compact tokens
//! - Issuing tokens with an issuer and an expiry stamped in
//! - Verifying tokens and their claims
//!
//! ## Token Layout
//!
//! | Claim | Type | Meaning |
//! |-------|------|---------|
//! | `issuer` | string | Application name that signed the token |
//! | `username` | string | Authenticated subject |
//! | `scopes` | string | Granted scopes, space separated |
//! | `expires_at` | integer | Unix timestamp (seconds) |
//!
//! Additional caller-supplied claims are carried alongside and survive a
//! round-trip unchanged.
//!
//! Tokens are never stored server-side. There is no revocation: a token is
//! trusted until `expires_at` passes.

pub mod claims;
pub mod error;
pub mod secret;
pub mod token;

pub use claims::{ClaimSet, RESERVED_CLAIMS, SubjectClaims};
pub use error::TokenError;
pub use secret::SigningSecret;
pub use token::{
    DEFAULT_TTL, IssuedToken, TokenCodec, TokenInfo, TokenIssuer, TokenVerifier, VerifiedToken,
    inspect_token_unverified,
};
