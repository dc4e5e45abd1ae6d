use crate::error::ApiError;
use crate::middleware::auth::VerifiedSession;
use crate::state::AppState;
use axum::{Extension, Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;
use tollgate_token::VerifiedToken;

pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "ok": true, "service": "tollgate-server", "app_name": state.config.app_name }))
}

/// Fixed payload for any live delegated session.
pub async fn privileged(Extension(session): Extension<VerifiedSession>) -> Json<Value> {
    tracing::debug!(session = session.id.short(), "Privileged resource served");
    Json(json!({ "privileged": true, "data": "hello there" }))
}

/// The provider's user-info document, fetched with the session's credential.
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<VerifiedSession>,
) -> Result<Json<Value>, ApiError> {
    let services = state.session.as_ref().ok_or(ApiError::NotLoggedIn)?;
    let body = services
        .resources
        .call_resource(&session.credential, &services.user_info_path)
        .await?;
    Ok(Json(body))
}

/// Body served by a configured resource once its scope guard has passed.
pub fn resource_body(name: &str, configured: Option<&Value>, token: &VerifiedToken) -> Value {
    match configured {
        Some(body) => body.clone(),
        None => json!({
            "resource": name,
            "username": token.username(),
            "scopes": token.scopes(),
        }),
    }
}
