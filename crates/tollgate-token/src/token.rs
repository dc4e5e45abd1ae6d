//! Token encoding, issuance and verification.

use crate::claims::{ClaimSet, SubjectClaims};
use crate::error::TokenError;
use crate::secret::SigningSecret;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Lifetime of a token when the caller does not ask for one: one week.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const ALGORITHM: Algorithm = Algorithm::HS256;
const ALGORITHM_NAME: &str = "HS256";

/// Encodes and decodes claim sets as HS256-signed compact tokens.
///
/// Decoding accepts exactly one algorithm. The header is checked before any
/// key material is used, so `alg: none` and every other algorithm are refused
/// as bad signatures.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM_NAME)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec for the given secret.
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry and issuer live in custom claims and are checked by `ClaimSet::validate`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a claim set.
    pub fn encode(&self, claims: &ClaimSet) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(ALGORITHM), claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token's signature and return its claims.
    ///
    /// Claims are not checked for expiry or issuer here.
    pub fn decode(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let algorithm = header_algorithm(token)?;
        if algorithm != ALGORITHM_NAME {
            return Err(TokenError::InvalidSignature);
        }

        let data = jsonwebtoken::decode::<ClaimSet>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

/// A freshly issued token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: ClaimSet,
}

impl IssuedToken {
    /// Seconds from `now` until the token expires.
    pub fn expires_in(&self, now: i64) -> i64 {
        self.claims.expires_at.map_or(0, |exp| (exp - now).max(0))
    }
}

/// Builds claim sets with issuer and expiry, then signs them.
///
/// The issuer does not authenticate anyone: callers must have checked
/// credentials before asking for a token.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    app_name: String,
    default_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer signing for `app_name` with a one week default lifetime.
    pub fn new(codec: TokenCodec, app_name: impl Into<String>) -> Self {
        Self {
            codec,
            app_name: app_name.into(),
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Override the default lifetime.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a signed token.
    pub fn issue(&self, subject: SubjectClaims, ttl: Option<Duration>) -> Result<String, TokenError> {
        self.issue_with_expiry(subject, ttl).map(|issued| issued.token)
    }

    /// Issue a signed token and return the claims it was built from.
    pub fn issue_with_expiry(
        &self,
        subject: SubjectClaims,
        ttl: Option<Duration>,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, ttl, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        subject: SubjectClaims,
        ttl: Option<Duration>,
        now: i64,
    ) -> Result<IssuedToken, TokenError> {
        subject.check()?;

        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl.as_secs() == 0 {
            return Err(TokenError::InvalidTtl);
        }
        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::InvalidTtl)?;
        let expires_at = now.checked_add(ttl_secs).ok_or(TokenError::InvalidTtl)?;

        let claims = ClaimSet {
            issuer: self.app_name.clone(),
            username: subject.username,
            scopes: subject.scopes,
            expires_at: Some(expires_at),
            extra: subject.extra,
        };
        let token = self.codec.encode(&claims)?;

        tracing::info!(
            subject = %claims.username,
            scopes = claims.scopes.len(),
            expires_at,
            "Issued access token"
        );

        Ok(IssuedToken { token, claims })
    }
}

/// Verifies tokens: signature first, then expiry and issuer.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    codec: TokenCodec,
    app_name: String,
}

impl TokenVerifier {
    /// Create a verifier that accepts tokens issued by `app_name`.
    pub fn new(codec: TokenCodec, app_name: impl Into<String>) -> Self {
        Self {
            codec,
            app_name: app_name.into(),
        }
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as of `now` (unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<VerifiedToken, TokenError> {
        let claims = self.codec.decode(token)?;
        claims.validate(&self.app_name, now)?;
        Ok(VerifiedToken { claims })
    }
}

/// A token whose signature, expiry and issuer have been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub claims: ClaimSet,
}

impl VerifiedToken {
    pub fn username(&self) -> &str {
        &self.claims.username
    }

    pub fn scopes(&self) -> &[String] {
        &self.claims.scopes
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.expires_at.unwrap_or_default()
    }
}

/// Inspect a token without verification (for debugging).
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed("expected three segments".into()));
    };

    let header = decode_segment(header)?;
    let algorithm = header
        .get("alg")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(TokenInfo {
        algorithm,
        claims: decode_segment(payload)?,
    })
}

/// Information about a token (for inspection).
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// The `alg` named in the header.
    pub algorithm: String,
    /// Raw payload claims.
    pub claims: serde_json::Value,
}

fn header_algorithm(token: &str) -> Result<String, TokenError> {
    let header = token
        .split('.')
        .next()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| TokenError::Malformed("missing header".into()))?;

    decode_segment(header)?
        .get("alg")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| TokenError::Malformed("header has no algorithm".into()))
}

fn decode_segment(segment: &str) -> Result<serde_json::Value, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const APP: &str = "myapp";

    fn secret(text: &str) -> SigningSecret {
        SigningSecret::new(text).unwrap()
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(TokenCodec::new(&secret("test-secret-for-tokens")), APP)
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(TokenCodec::new(&secret("test-secret-for-tokens")), APP)
    }

    #[test]
    fn test_issue_and_verify_token() {
        let issued = issuer()
            .issue_with_expiry(
                SubjectClaims::new("alice")
                    .with_scopes(["some.scope", "third.scope"])
                    .with_claim("tenant", "acme"),
                None,
            )
            .unwrap();

        let verified = verifier().verify(&issued.token).unwrap();
        assert_eq!(verified.claims, issued.claims);
        assert_eq!(verified.username(), "alice");
        assert_eq!(verified.scopes(), ["some.scope", "third.scope"]);
        assert_eq!(verified.claims.issuer, APP);
        assert_eq!(verified.claims.extra["tenant"], json!("acme"));
    }

    #[test]
    fn test_default_ttl_is_one_week() {
        let now = 1_700_000_000;
        let issued = issuer()
            .issue_at(SubjectClaims::new("alice"), None, now)
            .unwrap();
        assert_eq!(issued.claims.expires_at, Some(now + 604_800));
        assert_eq!(issued.expires_in(now), 604_800);
    }

    #[test]
    fn test_codec_round_trip_preserves_claims() {
        let codec = TokenCodec::new(&secret("test-secret-for-tokens"));
        let mut claims = ClaimSet {
            issuer: APP.into(),
            username: "bob".into(),
            scopes: vec!["read".into()],
            expires_at: Some(42),
            extra: Default::default(),
        };
        claims.extra.insert("n".into(), json!([1, 2, 3]));

        let decoded = codec.decode(&codec.encode(&claims).unwrap()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_different_secret_is_invalid_signature() {
        let token = issuer().issue(SubjectClaims::new("alice"), None).unwrap();
        let other = TokenVerifier::new(TokenCodec::new(&secret("another-secret-entirely")), APP);
        assert!(matches!(
            other.verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_payload_is_invalid_signature() {
        let token = issuer()
            .issue(SubjectClaims::new("alice").add_scope("read"), None)
            .unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            json!({"issuer": APP, "username": "alice", "scopes": "admin", "expires_at": i64::MAX})
                .to_string(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(
            verifier().verify(&forged),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_alg_none_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({"issuer": APP, "username": "mallory", "scopes": "", "expires_at": i64::MAX})
                .to_string(),
        );
        let token = format!("{}.{}.", header, payload);

        assert!(matches!(
            verifier().verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_other_hmac_algorithm_rejected() {
        let claims = ClaimSet {
            issuer: APP.into(),
            username: "alice".into(),
            scopes: vec![],
            expires_at: Some(i64::MAX),
            extra: Default::default(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret-for-tokens"),
        )
        .unwrap();

        assert!(matches!(
            verifier().verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        for input in ["", "not-a-token", "a.b.c", "!!!.???.###"] {
            assert!(
                matches!(verifier().verify(input), Err(TokenError::Malformed(_))),
                "{input:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now().timestamp();
        let issued = issuer()
            .issue_at(SubjectClaims::new("alice"), Some(Duration::from_secs(60)), now - 120)
            .unwrap();

        assert!(matches!(
            verifier().verify(&issued.token),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn test_expires_after_ttl_elapses() {
        let token = issuer()
            .issue(
                SubjectClaims::new("alice").add_scope("read"),
                Some(Duration::from_secs(1)),
            )
            .unwrap();
        assert!(verifier().verify(&token).is_ok());

        std::thread::sleep(Duration::from_secs(2));
        assert!(matches!(
            verifier().verify(&token),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn test_issuer_mismatch_rejected() {
        let token = issuer().issue(SubjectClaims::new("alice"), None).unwrap();
        let other_app =
            TokenVerifier::new(TokenCodec::new(&secret("test-secret-for-tokens")), "otherapp");
        assert!(matches!(
            other_app.verify(&token),
            Err(TokenError::IssuerMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(matches!(
            issuer().issue(SubjectClaims::new("alice"), Some(Duration::ZERO)),
            Err(TokenError::InvalidTtl)
        ));
        assert!(matches!(
            issuer().issue(SubjectClaims::new("alice"), Some(Duration::from_millis(500))),
            Err(TokenError::InvalidTtl)
        ));
    }

    #[test]
    fn test_inspect_token_unverified() {
        let token = issuer()
            .issue(SubjectClaims::new("alice").with_scopes(["a", "b"]), None)
            .unwrap();
        let info = inspect_token_unverified(&token).unwrap();
        assert_eq!(info.algorithm, "HS256");
        assert_eq!(info.claims["username"], json!("alice"));
        assert_eq!(info.claims["scopes"], json!("a b"));

        assert!(inspect_token_unverified("only.two").is_err());
    }
}
