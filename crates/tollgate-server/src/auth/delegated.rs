use crate::error::ApiError;
use crate::middleware::auth::{login_binding_from_headers, session_from_headers};
use crate::state::{AppState, SessionServices};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tollgate_session::AuthorizationCallback;

/// Where the browser lands after a successful login.
pub const POST_LOGIN_REDIRECT: &str = "/users/me";

fn services(state: &AppState) -> Result<&SessionServices, ApiError> {
    state
        .session
        .as_ref()
        .ok_or_else(|| ApiError::Internal("delegated login is not configured".into()))
}

fn header_value(value: String) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&value).map_err(|e| ApiError::Internal(e.to_string()))
}

/// `GET /login`: send the browser to the identity provider and bind the
/// pending login to it with a short-lived cookie.
pub async fn login(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let services = services(&state)?;
    let redirect_uri = state
        .redirect_uri()
        .ok_or_else(|| ApiError::Internal("delegated login is not configured".into()))?;
    let redirect = services.flow.begin_authorization(&redirect_uri)?;

    let binding = header_value(
        services
            .cookie
            .set_login_cookie(&redirect.login_binding, services.flow.state_ttl()),
    )?;
    let mut response = Redirect::to(&redirect.url).into_response();
    response.headers_mut().insert(header::SET_COOKIE, binding);
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Provider callback: exchange the code, then set the session cookie. The
/// login cookie is cleared whatever the outcome.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    let services = services(&state)?;
    let clear_binding = header_value(services.cookie.clear_login_cookie())?;

    let mut response = match complete(services, &headers, params).await {
        Ok(response) => response,
        Err(err) if !state.config.server.expose_upstream_errors => {
            err.redact_upstream().into_response()
        }
        Err(err) => err.into_response(),
    };
    response
        .headers_mut()
        .append(header::SET_COOKIE, clear_binding);
    Ok(response)
}

async fn complete(
    services: &SessionServices,
    headers: &HeaderMap,
    params: CallbackParams,
) -> Result<Response, ApiError> {
    let callback = AuthorizationCallback::from_params(
        params.code,
        params.state,
        params.error,
        params.error_description,
    )?;
    let previous = session_from_headers(&services.cookie, headers);
    let binding = login_binding_from_headers(&services.cookie, headers);

    let (id, _record) = services
        .flow
        .complete_authorization(previous.as_ref(), binding, callback)
        .await?;

    let cookie = header_value(services.cookie.set_cookie(&id)?)?;
    let mut response = Redirect::to(POST_LOGIN_REDIRECT).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// `POST /logout`: end the session and clear the cookie.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let services = services(&state)?;
    let ended = match session_from_headers(&services.cookie, &headers) {
        Some(id) => services.flow.logout(&id).await?,
        None => false,
    };

    let clear = header_value(services.cookie.clear_cookie())?;
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear)],
        Json(json!({ "logged_out": ended })),
    )
        .into_response())
}
