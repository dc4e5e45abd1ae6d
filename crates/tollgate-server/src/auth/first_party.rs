use crate::error::ApiError;
use crate::state::AppState;
use axum::{Json, body::Bytes, extract::State};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tollgate_token::SubjectClaims;

/// Parsed `application/x-www-form-urlencoded` body of `POST /token`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
    pub scopes: Vec<String>,
}

impl TokenRequest {
    /// `scope` may repeat and each value may hold several space-separated scopes.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let mut username = None;
        let mut password = None;
        let mut scopes: Vec<String> = Vec::new();

        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "username" => username = Some(value.into_owned()),
                "password" => password = Some(value.into_owned()),
                "scope" => {
                    for scope in value.split_whitespace() {
                        if !scopes.iter().any(|s| s == scope) {
                            scopes.push(scope.to_string());
                        }
                    }
                }
                "grant_type" if value != "password" => {
                    return Err(ApiError::InvalidRequest(format!(
                        "unsupported grant_type '{value}'"
                    )));
                }
                _ => {}
            }
        }

        let username = username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApiError::InvalidRequest("username is required".into()))?;
        let password =
            password.ok_or_else(|| ApiError::InvalidRequest("password is required".into()))?;

        Ok(Self {
            username,
            password,
            scopes,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub scope: String,
}

/// `POST /token`: exchange username and password for a signed access token.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = TokenRequest::parse(&body)?;

    if let Some(unknown) = request
        .scopes
        .iter()
        .find(|s| !state.config.is_known_scope(s))
    {
        return Err(ApiError::InvalidScope(unknown.clone()));
    }

    if !state
        .credentials
        .validate(&request.username, &request.password)
        .await?
    {
        tracing::info!(username = %request.username, "Rejected login");
        return Err(ApiError::InvalidCredentials);
    }

    if let Some(allowed) = state.credentials.grantable_scopes(&request.username) {
        if let Some(denied) = request.scopes.iter().find(|s| !allowed.contains(s)) {
            return Err(ApiError::InvalidScope(denied.clone()));
        }
    }

    let subject = SubjectClaims::new(request.username).with_scopes(request.scopes);
    let issued = state.issuer.issue_with_expiry(subject, None)?;

    Ok(Json(TokenResponse {
        expires_in: issued.expires_in(Utc::now().timestamp()),
        scope: issued.claims.scopes.join(" "),
        access_token: issued.token,
        token_type: "bearer",
    }))
}
