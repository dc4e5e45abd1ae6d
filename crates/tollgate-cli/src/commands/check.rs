//! `tollgate check` command implementation.
//!
//! Loads the configuration the same way the server does, then looks for
//! settings that are valid but risky.

use std::fmt;
use std::path::Path;
use tollgate_core::{CredentialMode, TollgateConfig};
use tollgate_token::SigningSecret;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Config section the finding is about, e.g. "token" or "resources".
    pub category: String,
    pub message: String,
}

impl CheckFinding {
    fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
        }
    }

    fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    fn info(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }
}

#[derive(Debug, Default)]
pub struct CheckResults {
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    fn add(&mut self, finding: CheckFinding) {
        self.findings.push(finding);
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Print findings grouped by severity, most severe first.
    pub fn print_summary(&self) {
        let mut sorted: Vec<_> = self.findings.iter().collect();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.category.cmp(&b.category)));

        for finding in sorted {
            println!("[{}] {}: {}", finding.severity, finding.category, finding.message);
        }

        let errors = self.count(Severity::Error);
        let warnings = self.count(Severity::Warning);
        if errors == 0 {
            println!("✔ Configuration is valid ({} warning(s))", warnings);
        } else {
            println!("✘ {} error(s), {} warning(s)", errors, warnings);
        }
    }
}

/// Run every check against the configuration at `path`.
pub fn run(path: &Path) -> CheckResults {
    let mut results = CheckResults::default();

    let config = match TollgateConfig::load_with_context(path) {
        Ok(config) => config,
        Err(e) => {
            results.add(CheckFinding::error("config", e.to_string()));
            return results;
        }
    };

    check_secrets(&config, &mut results);
    check_credentials(&config, &mut results);
    check_resources(&config, &mut results);
    check_session(&config, &mut results);
    results
}

fn check_secrets(config: &TollgateConfig, results: &mut CheckResults) {
    match config.token.resolve_secret() {
        Ok(Some(secret)) => {
            if let Err(e) = SigningSecret::new(secret) {
                results.add(CheckFinding::error("token", e.to_string()));
            }
        }
        Ok(None) => results.add(CheckFinding::error(
            "token",
            "no signing secret configured (token.secret_env, token.secret_file or token.secret)",
        )),
        Err(e) => results.add(CheckFinding::error(
            "token",
            format!("failed to read signing secret: {}", e),
        )),
    }

    if config.token.secret.is_some() {
        results.add(CheckFinding::warning(
            "token",
            "token.secret is stored inline; prefer token.secret_env or token.secret_file",
        ));
    }

    if let Some(provider) = &config.provider {
        if provider.client_secret.is_some() {
            results.add(CheckFinding::warning(
                "provider",
                "provider.client_secret is stored inline; prefer client_secret_env or client_secret_file",
            ));
        }
        match config.session.resolve_cookie_secret() {
            Ok(Some(secret)) => {
                if let Err(e) = SigningSecret::new(secret) {
                    results.add(CheckFinding::error("session", e.to_string()));
                }
            }
            Ok(None) => results.add(CheckFinding::error(
                "session",
                "a provider is configured but no session cookie secret is set",
            )),
            Err(e) => results.add(CheckFinding::error(
                "session",
                format!("failed to read session cookie secret: {}", e),
            )),
        }
    }
}

fn check_credentials(config: &TollgateConfig, results: &mut CheckResults) {
    if config.credentials.mode == CredentialMode::AcceptAll {
        results.add(CheckFinding::warning(
            "credentials",
            "credentials.mode is accept_all: any username and password will be granted tokens",
        ));
    }
}

fn check_resources(config: &TollgateConfig, results: &mut CheckResults) {
    if config.resources.is_empty() {
        results.add(CheckFinding::info("resources", "no protected resources declared"));
    }
    for (name, resource) in &config.resources {
        if resource.scopes.is_empty() {
            results.add(CheckFinding::info(
                "resources",
                format!("'{}' requires no scopes; any valid token is accepted", name),
            ));
        }
    }
}

fn check_session(config: &TollgateConfig, results: &mut CheckResults) {
    if config.provider.is_none() {
        return;
    }
    let https = config
        .server
        .public_url
        .as_deref()
        .is_some_and(|u| u.starts_with("https://"));
    if https && !config.session.secure_cookie {
        results.add(CheckFinding::warning(
            "session",
            "public_url is https but session.secure_cookie is false",
        ));
    }
}
