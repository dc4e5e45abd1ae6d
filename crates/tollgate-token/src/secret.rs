//! Shared signing secret management.

use crate::error::TokenError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// Minimum length accepted for a signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Symmetric secret used to sign and verify HS256 tokens.
///
/// The secret's text is used as the HMAC key verbatim, so a secret copied out
/// of a config file or environment variable works unchanged.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret {
    value: String,
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecret")
            .field("value", &"<redacted>")
            .finish()
    }
}

impl SigningSecret {
    /// Generate a new random secret (32 random bytes, base64url encoded).
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);

        Self {
            value: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Wrap an existing secret string.
    pub fn new(value: impl Into<String>) -> Result<Self, TokenError> {
        let value = value.into();
        if value.len() < MIN_SECRET_LEN {
            return Err(TokenError::InvalidSecret(format!(
                "secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self { value })
    }

    /// Key material for HMAC.
    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }

    /// The secret text. Only for writing it out; never log it.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Save the secret to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), TokenError> {
        std::fs::write(path, &self.value)?;
        Ok(())
    }

    /// Load a secret from a file. Surrounding whitespace is ignored.
    pub fn load_from_file(path: &Path) -> Result<Self, TokenError> {
        let value = std::fs::read_to_string(path)?;
        Self::new(value.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_secret_generation() {
        let a = SigningSecret::generate();
        let b = SigningSecret::generate();
        assert_eq!(a.expose().len(), 43);
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            SigningSecret::new("short"),
            Err(TokenError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = SigningSecret::new("a-very-long-secret-value").unwrap();
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("a-very-long-secret-value"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_secret_file_save_load() {
        let secret = SigningSecret::generate();

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", secret.expose()).unwrap();

        let loaded = SigningSecret::load_from_file(file.path()).unwrap();
        assert_eq!(secret, loaded);

        let other = NamedTempFile::new().unwrap();
        secret.save_to_file(other.path()).unwrap();
        assert_eq!(SigningSecret::load_from_file(other.path()).unwrap(), secret);
    }
}
