use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tollgate_core::TollgateConfig;
use tollgate_policy::{CredentialValidator, ScopeAuthorizer, validator_from_config};
use tollgate_session::{
    DelegationFlow, InMemorySessionStore, OAuthProvider, ResourceClient, SessionCookie,
    SessionStore,
};
use tollgate_token::{SigningSecret, TokenCodec, TokenIssuer, TokenVerifier};

/// Shared application state.
pub struct AppState {
    pub config: TollgateConfig,
    pub issuer: TokenIssuer,
    pub authorizer: ScopeAuthorizer,
    pub credentials: Arc<dyn CredentialValidator>,

    /// Present only when an identity provider is configured.
    pub session: Option<SessionServices>,
}

/// Everything the delegated login routes need.
pub struct SessionServices {
    pub flow: DelegationFlow,
    pub cookie: SessionCookie,
    pub resources: ResourceClient,
    pub user_info_path: String,
    pub callback_path: String,
}

impl AppState {
    /// Build state from a validated configuration, resolving every secret.
    pub fn from_config(config: TollgateConfig) -> anyhow::Result<Self> {
        let credentials = validator_from_config(&config.credentials);
        Self::with_credentials(config, credentials)
    }

    /// Like [`AppState::from_config`] with a caller-supplied credential validator.
    pub fn with_credentials(
        config: TollgateConfig,
        credentials: Arc<dyn CredentialValidator>,
    ) -> anyhow::Result<Self> {
        let secret = config
            .token
            .resolve_secret()
            .context("failed to read token signing secret")?
            .context("no token signing secret configured (token.secret_env, token.secret_file or token.secret)")?;
        let secret = SigningSecret::new(secret).context("invalid token signing secret")?;

        let codec = TokenCodec::new(&secret);
        let issuer = TokenIssuer::new(codec.clone(), config.app_name.clone())
            .with_default_ttl(Duration::from_secs(config.token.default_ttl_secs));
        let authorizer = ScopeAuthorizer::new(TokenVerifier::new(codec, config.app_name.clone()));

        let session = match &config.provider {
            Some(provider) => {
                let cookie_secret = config
                    .session
                    .resolve_cookie_secret()
                    .context("failed to read session cookie secret")?
                    .context("a provider is configured but no session cookie secret is set")?;
                let cookie_secret =
                    SigningSecret::new(cookie_secret).context("invalid session cookie secret")?;

                let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
                let session_ttl = Duration::from_secs(config.session.ttl_secs);
                let flow = DelegationFlow::new(
                    Arc::new(OAuthProvider::from_config(provider)?),
                    store,
                    &cookie_secret,
                    session_ttl,
                    Duration::from_secs(config.session.state_ttl_secs),
                );
                let cookie = SessionCookie::new(
                    config.session.cookie_name.clone(),
                    &cookie_secret,
                    session_ttl,
                    config.session.secure_cookie,
                );

                Some(SessionServices {
                    flow,
                    cookie,
                    resources: ResourceClient::from_config(provider)?,
                    user_info_path: provider.user_info_path.clone(),
                    callback_path: provider.callback_path.clone(),
                })
            }
            None => None,
        };

        Ok(Self {
            config,
            issuer,
            authorizer,
            credentials,
            session,
        })
    }

    /// Absolute callback URL registered with the provider.
    pub fn redirect_uri(&self) -> Option<String> {
        self.session.as_ref().map(|s| {
            format!(
                "{}{}",
                self.config.server.public_base_url(),
                s.callback_path
            )
        })
    }
}
