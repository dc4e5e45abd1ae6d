//! Provider-delegated login flow.
//!
//! ```text
//! Unauthenticated --begin_authorization--> PendingExchange
//! PendingExchange --callback(code), exchange ok--> Authenticated (record stored)
//! PendingExchange --callback(error) | exchange failed--> Unauthenticated (nothing stored)
//! Authenticated --expiry | logout--> Unauthenticated
//! ```
//!
//! The pending state lives only in the signed `state` parameter and the signed
//! login cookie set on the browser that asked to log in. Both carry the same
//! binding nonce, so a `state` handed to a different browser is rejected.
//! Nothing is stored until the exchange has fully succeeded.

use crate::cookie::{ValueSigner, random_nonce};
use crate::error::SessionError;
use crate::provider::IdentityProvider;
use crate::record::{DelegatedCredential, SessionId, SessionRecord};
use crate::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tollgate_token::SigningSecret;

/// Where to send the user agent to start a provider login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectInstruction {
    pub url: String,
    pub state: String,
    /// Signed login cookie value the browser must send back to the callback.
    pub login_binding: String,
}

/// What the provider sent back to the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationCallback {
    Code { code: String, state: String },
    Error { error: String, description: Option<String> },
}

impl AuthorizationCallback {
    /// Interpret callback query parameters. A provider error wins over a code.
    pub fn from_params(
        code: Option<String>,
        state: Option<String>,
        error: Option<String>,
        error_description: Option<String>,
    ) -> Result<Self, SessionError> {
        if let Some(error) = error {
            return Ok(Self::Error {
                error,
                description: error_description,
            });
        }
        match (code, state) {
            (Some(code), Some(state)) if !code.is_empty() => Ok(Self::Code { code, state }),
            (_, None) => Err(SessionError::InvalidState("callback has no state".into())),
            _ => Err(SessionError::InvalidState("callback has no code".into())),
        }
    }
}

/// Runs the authorization-code exchange and owns the session records it creates.
pub struct DelegationFlow {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
    signer: ValueSigner,
    session_ttl: Duration,
    state_ttl: Duration,
}

impl DelegationFlow {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn SessionStore>,
        state_secret: &SigningSecret,
        session_ttl: Duration,
        state_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            signer: ValueSigner::new(state_secret),
            session_ttl,
            state_ttl,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// How long a started login stays valid.
    pub fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    /// Build the provider redirect. Nothing is stored locally.
    pub fn begin_authorization(&self, redirect_uri: &str) -> Result<RedirectInstruction, SessionError> {
        let binding = random_nonce();
        let state = self.signer.sign_state(redirect_uri, &binding, self.state_ttl)?;
        let login_binding = self.signer.sign_binding(&binding, self.state_ttl)?;
        let url = self.provider.authorize_url(redirect_uri, &state)?;
        Ok(RedirectInstruction {
            url,
            state,
            login_binding,
        })
    }

    /// Finish a login started by the browser holding `login_binding`. On
    /// success the new session is stored in one write and any session the
    /// caller held before is removed.
    pub async fn complete_authorization(
        &self,
        previous: Option<&SessionId>,
        login_binding: Option<&str>,
        callback: AuthorizationCallback,
    ) -> Result<(SessionId, SessionRecord), SessionError> {
        let (code, state) = match callback {
            AuthorizationCallback::Error { error, description } => {
                tracing::warn!(error = %error, "Identity provider returned an authorization error");
                return Err(SessionError::UpstreamAuth { error, description });
            }
            AuthorizationCallback::Code { code, state } => (code, state),
        };

        let state = self.signer.verify_state(&state)?;
        let bound = login_binding.and_then(|value| self.signer.verify_binding(value));
        if bound.as_deref() != Some(state.binding.as_str()) {
            tracing::warn!(
                has_login_cookie = login_binding.is_some(),
                "Authorization state was not issued to this browser"
            );
            return Err(SessionError::InvalidState(
                "state was not issued to this browser".into(),
            ));
        }

        let ttl = chrono::Duration::from_std(self.session_ttl)
            .map_err(|e| SessionError::Store(e.to_string()))?;
        let credential = self.provider.exchange_code(&code, &state.redirect_uri).await?;

        let id = SessionId::generate();
        let record = SessionRecord::new(credential, ttl)?;
        self.store.insert(id.clone(), record.clone()).await?;

        if let Some(previous) = previous {
            if let Err(e) = self.store.remove(previous).await {
                tracing::warn!(
                    session = previous.short(),
                    error = %e,
                    "Failed to remove the previous session"
                );
            }
        }

        tracing::info!(session = id.short(), "Session established");
        Ok((id, record))
    }

    /// The stored provider credential, or `NotLoggedIn`.
    pub async fn get_delegated_credential(
        &self,
        id: Option<&SessionId>,
    ) -> Result<DelegatedCredential, SessionError> {
        let id = id.ok_or(SessionError::NotLoggedIn)?;
        self.store
            .get(id)
            .await?
            .map(|record| record.credential)
            .ok_or(SessionError::NotLoggedIn)
    }

    /// End a session. Returns whether one existed.
    pub async fn logout(&self, id: &SessionId) -> Result<bool, SessionError> {
        let removed = self.store.remove(id).await?;
        if removed {
            tracing::info!(session = id.short(), "Session ended");
        }
        Ok(removed)
    }
}
