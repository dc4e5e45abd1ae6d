use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tollgate_policy::{ScopeAuthorizer, ScopeSet};
use tollgate_session::{DelegatedCredential, SessionId};

/// Scopes one route requires, with the authorizer that checks them.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    pub authorizer: ScopeAuthorizer,
    pub required: ScopeSet,
}

impl ScopeGuard {
    pub fn new(authorizer: ScopeAuthorizer, required: ScopeSet) -> Self {
        Self {
            authorizer,
            required,
        }
    }
}

/// Inserted into request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    pub id: SessionId,
    pub credential: DelegatedCredential,
}

/// Axum middleware: verify the bearer token and enforce the route's scopes.
///
/// On success the [`tollgate_token::VerifiedToken`] is available to the
/// handler as an extension.
pub async fn require_scopes(
    State(guard): State<Arc<ScopeGuard>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or(ApiError::MissingToken)?;
    let verified = guard
        .authorizer
        .authorize(&token, &guard.required)
        .into_result()?;

    req.extensions_mut().insert(verified);
    Ok(next.run(req).await)
}

/// Axum middleware: resolve the session cookie into a delegated credential.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let services = state.session.as_ref().ok_or(ApiError::NotLoggedIn)?;
    let id = session_from_headers(&services.cookie, req.headers()).ok_or(ApiError::NotLoggedIn)?;
    let credential = services.flow.get_delegated_credential(Some(&id)).await?;

    req.extensions_mut()
        .insert(VerifiedSession { id, credential });
    Ok(next.run(req).await)
}

/// Session id from the request's `Cookie` headers, if a valid one is present.
pub(crate) fn session_from_headers(
    cookie: &tollgate_session::SessionCookie,
    headers: &HeaderMap,
) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|h| cookie.from_cookie_header(h))
}

/// Raw login cookie value from the request's `Cookie` headers.
pub(crate) fn login_binding_from_headers<'a>(
    cookie: &tollgate_session::SessionCookie,
    headers: &'a HeaderMap,
) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|h| cookie.login_from_cookie_header(h))
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        h
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")).as_deref(), Some("abc.def"));
        assert_eq!(extract_bearer(&headers("bearer  abc ")).as_deref(), Some("abc"));
        assert!(extract_bearer(&headers("Basic dXNlcjpwYXNz")).is_none());
        assert!(extract_bearer(&headers("Bearer ")).is_none());
        assert!(extract_bearer(&HeaderMap::new()).is_none());
    }
}
