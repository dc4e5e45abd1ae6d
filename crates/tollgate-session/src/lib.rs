//! # tollgate-session
//!
//! Provider-delegated sessions.
//!
//! A user logs in at an external OAuth2 identity provider. Tollgate exchanges
//! the authorization code for the provider's access token, keeps that token
//! server-side under a random session id, and hands the browser only a signed
//! cookie naming the session. Later requests use the stored credential to call
//! the provider's API on the user's behalf.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`DelegationFlow`] | begin/complete authorization, credential lookup, logout |
//! | [`SessionStore`] | session id to record mapping |
//! | [`SessionCookie`] | signed cookie carrying the session id |
//! | [`IdentityProvider`] | authorize URL and code exchange |
//! | [`ResourceClient`] | single-attempt bearer calls to the resource API |

pub mod cookie;
pub mod downstream;
pub mod error;
pub mod flow;
pub mod provider;
pub mod record;
pub mod store;

pub use cookie::{SessionCookie, ValueSigner, VerifiedState};
pub use downstream::ResourceClient;
pub use error::SessionError;
pub use flow::{AuthorizationCallback, DelegationFlow, RedirectInstruction};
pub use provider::{IdentityProvider, OAuthProvider, http_client};
pub use record::{DelegatedCredential, SessionId, SessionRecord};
pub use store::{InMemorySessionStore, SessionStore, spawn_purge_task};
