//! Signed session cookie and authorization state values.
//!
//! All of them are short HS256 tokens signed with the session secret. Each
//! carries a `purpose` claim so a cookie can never be replayed as a state value
//! or the other way round.
//!
//! A login is bound to the browser that started it: the `state` sent to the
//! provider and the short-lived login cookie set on the browser hold the same
//! random binding nonce.

use crate::error::SessionError;
use crate::record::SessionId;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tollgate_token::SigningSecret;

const PURPOSE_SESSION: &str = "session";
const PURPOSE_STATE: &str = "state";
const PURPOSE_LOGIN: &str = "login";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    purpose: String,
    value: String,
    nonce: String,
    exp: i64,
}

/// A verified authorization `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedState {
    pub redirect_uri: String,
    /// Nonce the matching login cookie must carry.
    pub binding: String,
}

/// Random base64url nonce.
pub fn random_nonce() -> String {
    let mut nonce = [0u8; 16];
    rand::rng().fill_bytes(&mut nonce);
    URL_SAFE_NO_PAD.encode(nonce)
}

/// HS256 signer for small purpose-tagged values.
#[derive(Clone)]
pub struct ValueSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for ValueSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSigner").finish_non_exhaustive()
    }
}

impl ValueSigner {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn sign(&self, purpose: &str, value: &str, ttl: Duration) -> Result<String, SessionError> {
        self.sign_with_nonce(purpose, value, random_nonce(), ttl)
    }

    fn sign_with_nonce(
        &self,
        purpose: &str,
        value: &str,
        nonce: String,
        ttl: Duration,
    ) -> Result<String, SessionError> {
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|ttl| Utc::now().timestamp().checked_add(ttl))
            .ok_or_else(|| SessionError::Signing(format!("lifetime of {:?} is too large", ttl)))?;

        let envelope = Envelope {
            purpose: purpose.to_string(),
            value: value.to_string(),
            nonce,
            exp,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &envelope, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    fn open(&self, purpose: &str, token: &str) -> Option<Envelope> {
        let data = jsonwebtoken::decode::<Envelope>(token, &self.decoding, &self.validation).ok()?;
        (data.claims.purpose == purpose).then_some(data.claims)
    }

    fn verify(&self, purpose: &str, token: &str) -> Option<String> {
        self.open(purpose, token).map(|envelope| envelope.value)
    }

    /// Sign an authorization `state` that remembers the redirect URI and the
    /// browser binding nonce.
    pub fn sign_state(
        &self,
        redirect_uri: &str,
        binding: &str,
        ttl: Duration,
    ) -> Result<String, SessionError> {
        self.sign_with_nonce(PURPOSE_STATE, redirect_uri, binding.to_string(), ttl)
    }

    /// Verify a `state` and return what it was issued for.
    pub fn verify_state(&self, state: &str) -> Result<VerifiedState, SessionError> {
        self.open(PURPOSE_STATE, state)
            .map(|envelope| VerifiedState {
                redirect_uri: envelope.value,
                binding: envelope.nonce,
            })
            .ok_or_else(|| SessionError::InvalidState("state is forged or expired".into()))
    }

    /// Signed login cookie value carrying a binding nonce.
    pub fn sign_binding(&self, binding: &str, ttl: Duration) -> Result<String, SessionError> {
        self.sign(PURPOSE_LOGIN, binding, ttl)
    }

    /// Binding nonce from a login cookie value.
    pub fn verify_binding(&self, value: &str) -> Option<String> {
        self.verify(PURPOSE_LOGIN, value)
    }
}

/// Settings and signing for the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    ttl: Duration,
    secure: bool,
    signer: ValueSigner,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secret: &SigningSecret, ttl: Duration, secure: bool) -> Self {
        Self {
            name: name.into(),
            ttl,
            secure,
            signer: ValueSigner::new(secret),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signed cookie value for a session id.
    pub fn seal(&self, id: &SessionId) -> Result<String, SessionError> {
        self.signer.sign(PURPOSE_SESSION, id.as_str(), self.ttl)
    }

    /// Session id from a cookie value, if the signature and expiry check out.
    pub fn open(&self, value: &str) -> Option<SessionId> {
        self.signer
            .verify(PURPOSE_SESSION, value)
            .map(SessionId::from)
    }

    /// `Set-Cookie` header value establishing the session.
    pub fn set_cookie(&self, id: &SessionId) -> Result<String, SessionError> {
        let mut header = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name,
            self.seal(id)?,
            self.ttl.as_secs()
        );
        if self.secure {
            header.push_str("; Secure");
        }
        Ok(header)
    }

    /// `Set-Cookie` header value removing the session cookie.
    pub fn clear_cookie(&self) -> String {
        let mut header = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.name);
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }

    /// Find and open the session cookie in a `Cookie` request header.
    pub fn from_cookie_header(&self, header: &str) -> Option<SessionId> {
        find_cookie(header, &self.name).and_then(|value| self.open(value))
    }

    /// Name of the cookie that binds a pending login to the browser.
    pub fn login_cookie_name(&self) -> String {
        format!("{}_login", self.name)
    }

    /// `Set-Cookie` header value for a pending login's binding value.
    pub fn set_login_cookie(&self, value: &str, max_age: Duration) -> String {
        let mut header = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.login_cookie_name(),
            value,
            max_age.as_secs()
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }

    /// `Set-Cookie` header value removing the login cookie.
    pub fn clear_login_cookie(&self) -> String {
        let mut header = format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.login_cookie_name()
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }

    /// Raw login cookie value from a `Cookie` request header.
    pub fn login_from_cookie_header<'a>(&self, header: &'a str) -> Option<&'a str> {
        find_cookie(header, &self.login_cookie_name()).filter(|value| !value.is_empty())
    }
}

fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SigningSecret {
        SigningSecret::new("cookie-signing-secret").unwrap()
    }

    fn cookie() -> SessionCookie {
        SessionCookie::new("tollgate_session", &secret(), Duration::from_secs(3600), false)
    }

    #[test]
    fn test_seal_and_open() {
        let id = SessionId::generate();
        let value = cookie().seal(&id).unwrap();
        assert_eq!(cookie().open(&value), Some(id));
    }

    #[test]
    fn test_forged_cookie_rejected() {
        let id = SessionId::generate();
        let other = SessionCookie::new(
            "tollgate_session",
            &SigningSecret::new("another-cookie-secret").unwrap(),
            Duration::from_secs(3600),
            false,
        );
        let value = other.seal(&id).unwrap();
        assert!(cookie().open(&value).is_none());
        assert!(cookie().open("garbage").is_none());
    }

    #[test]
    fn test_state_cannot_be_used_as_cookie() {
        let signer = ValueSigner::new(&secret());
        let state = signer
            .sign_state("http://localhost/auth", "nonce-1", Duration::from_secs(60))
            .unwrap();
        let verified = signer.verify_state(&state).unwrap();
        assert_eq!(verified.redirect_uri, "http://localhost/auth");
        assert_eq!(verified.binding, "nonce-1");
        assert!(cookie().open(&state).is_none());
        assert!(signer.verify_binding(&state).is_none());

        let value = cookie().seal(&SessionId::generate()).unwrap();
        assert!(matches!(
            signer.verify_state(&value),
            Err(SessionError::InvalidState(_))
        ));
    }

    #[test]
    fn test_states_are_unique() {
        let signer = ValueSigner::new(&secret());
        let a = signer
            .sign_state("http://x/auth", &random_nonce(), Duration::from_secs(60))
            .unwrap();
        let b = signer
            .sign_state("http://x/auth", &random_nonce(), Duration::from_secs(60))
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_binding_value_is_not_a_state() {
        let signer = ValueSigner::new(&secret());
        let value = signer.sign_binding("nonce-1", Duration::from_secs(60)).unwrap();
        assert_eq!(signer.verify_binding(&value).as_deref(), Some("nonce-1"));
        assert!(signer.verify_state(&value).is_err());
        assert!(cookie().open(&value).is_none());
    }

    #[test]
    fn test_huge_lifetime_is_an_error() {
        let signer = ValueSigner::new(&secret());
        let ttl = Duration::from_secs(u64::MAX);
        assert!(matches!(
            signer.sign_binding("nonce", ttl),
            Err(SessionError::Signing(_))
        ));
        let ttl = Duration::from_secs(i64::MAX as u64);
        assert!(matches!(
            signer.sign_state("http://x/auth", "nonce", ttl),
            Err(SessionError::Signing(_))
        ));
    }

    #[test]
    fn test_login_cookie_header() {
        let set = cookie().set_login_cookie("signed-value", Duration::from_secs(600));
        assert!(set.starts_with("tollgate_session_login=signed-value;"));
        assert!(set.contains("Max-Age=600"));
        assert!(cookie().clear_login_cookie().contains("Max-Age=0"));

        let header = "tollgate_session=abc; tollgate_session_login=signed-value";
        assert_eq!(cookie().login_from_cookie_header(header), Some("signed-value"));
        assert!(cookie().login_from_cookie_header("tollgate_session_login=").is_none());
        assert!(cookie().login_from_cookie_header("tollgate_session=abc").is_none());
    }

    #[test]
    fn test_cookie_header_round_trip() {
        let id = SessionId::generate();
        let set = cookie().set_cookie(&id).unwrap();
        assert!(set.starts_with("tollgate_session="));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Max-Age=3600"));
        assert!(!set.contains("Secure"));

        let value = set
            .split(';')
            .next()
            .and_then(|kv| kv.split_once('='))
            .map(|(_, v)| v.to_string())
            .unwrap();
        let header = format!("theme=dark; tollgate_session={}; other=1", value);
        assert_eq!(cookie().from_cookie_header(&header), Some(id));
        assert!(cookie().from_cookie_header("theme=dark").is_none());
    }

    #[test]
    fn test_clear_cookie() {
        let secure = SessionCookie::new("sid", &secret(), Duration::from_secs(60), true);
        let header = secure.clear_cookie();
        assert!(header.starts_with("sid=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.ends_with("; Secure"));
    }
}
