//! Token commands.
//!
//! `tollgate token issue` - Issue a token for a username and scopes.
//! `tollgate token verify` - Verify a token against the configured secret and app name.
//! `tollgate token inspect` - Decode a token without verification.

use super::{load_config, read_token_arg, signing_secret};
use anyhow::Context;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tollgate_token::{
    SubjectClaims, TokenCodec, TokenIssuer, TokenVerifier, inspect_token_unverified,
};

/// Parse a `--ttl` value such as "90s", "12h" or "7days".
fn parse_ttl(s: &str) -> anyhow::Result<Duration> {
    humantime::parse_duration(s.trim()).with_context(|| format!("Invalid --ttl value '{}'", s))
}

/// Split a `key=value` claim. The value is parsed as JSON when possible.
fn parse_claim(pair: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = pair
        .split_once('=')
        .with_context(|| format!("Invalid --claim '{}'. Expected key=value", pair))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Invalid --claim '{}'. Key must not be empty", pair);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn format_expiry(expires_at: i64) -> String {
    Utc.timestamp_opt(expires_at, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| expires_at.to_string())
}

pub fn issue(
    config_path: &Path,
    username: String,
    scopes: Vec<String>,
    ttl: Option<String>,
    claims: Vec<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let secret = signing_secret(&config)?;
    let issuer = TokenIssuer::new(TokenCodec::new(&secret), config.app_name.clone())
        .with_default_ttl(Duration::from_secs(config.token.default_ttl_secs));

    if let Some(unknown) = scopes.iter().find(|s| !config.is_known_scope(s)) {
        anyhow::bail!("Scope '{}' is not declared in the scope catalog", unknown);
    }

    let mut subject = SubjectClaims::new(username).with_scopes(scopes);
    for pair in &claims {
        let (key, value) = parse_claim(pair)?;
        subject = subject.with_claim(key, value);
    }

    let ttl = ttl.as_deref().map(parse_ttl).transpose()?;
    let issued = issuer.issue_with_expiry(subject, ttl)?;

    match output {
        Some(path) => {
            fs::write(&path, &issued.token)?;
            println!("✔ Token written to: {}", path.display());
            println!("  Username: {}", issued.claims.username);
            println!("  Scopes: {}", issued.claims.scopes.join(" "));
            if let Some(exp) = issued.claims.expires_at {
                println!("  Expires: {}", format_expiry(exp));
            }
        }
        None => println!("{}", issued.token),
    }

    Ok(())
}

pub fn verify(config_path: &Path, token: String) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let secret = signing_secret(&config)?;
    let verifier = TokenVerifier::new(TokenCodec::new(&secret), config.app_name.clone());

    let token = read_token_arg(token)?;
    let verified = verifier.verify(&token).context("Token verification failed")?;

    println!("✔ Token is valid");
    println!("  Issuer: {}", verified.claims.issuer);
    println!("  Username: {}", verified.username());
    println!("  Scopes: {}", verified.scopes().join(" "));
    println!("  Expires: {}", format_expiry(verified.expires_at()));
    Ok(())
}

pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = read_token_arg(token)?;
    let info = inspect_token_unverified(&token)?;

    println!("Token Information (signature NOT verified):");
    println!("  Algorithm: {}", info.algorithm);
    println!();
    println!("{}", serde_json::to_string_pretty(&info.claims)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("tollgate.yaml");
        fs::write(
            &path,
            r#"
app_name: myapp
token:
  secret: "cli-test-signing-secret"
scopes:
  some.scope: "Some scope"
"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_ttl("12h").unwrap(), Duration::from_secs(12 * 3600));
        assert!(parse_ttl("soon").is_err());
    }

    #[test]
    fn test_parse_claim() {
        assert_eq!(
            parse_claim("tenant=acme").unwrap(),
            ("tenant".to_string(), Value::String("acme".into()))
        );
        assert_eq!(
            parse_claim("level=3").unwrap(),
            ("level".to_string(), Value::from(3))
        );
        assert!(parse_claim("novalue").is_err());
        assert!(parse_claim("=x").is_err());
    }

    #[test]
    fn test_issue_then_verify_from_file() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());
        let token_path = dir.path().join("token.jwt");

        issue(
            &config,
            "johndoe".into(),
            vec!["some.scope".into()],
            Some("1h".into()),
            vec!["tenant=acme".into()],
            Some(token_path.clone()),
        )
        .unwrap();

        let token = fs::read_to_string(&token_path).unwrap();
        let info = inspect_token_unverified(&token).unwrap();
        assert_eq!(info.claims["username"], "johndoe");
        assert_eq!(info.claims["tenant"], "acme");

        verify(&config, token_path.display().to_string()).unwrap();
        inspect(token).unwrap();
    }

    #[test]
    fn test_issue_rejects_unknown_scope() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());
        let err = issue(
            &config,
            "johndoe".into(),
            vec!["admin.scope".into()],
            None,
            vec![],
            Some(dir.path().join("t")),
        )
        .unwrap_err();
        assert!(err.to_string().contains("admin.scope"));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());
        assert!(verify(&config, "not.a.token".into()).is_err());
    }
}
