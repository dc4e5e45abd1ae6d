use crate::auth::{delegated, first_party};
use crate::middleware::handlers::{self, resource_body};
use crate::middleware::{ScopeGuard, require_scopes, require_session};
use crate::state::AppState;
use axum::{
    Extension, Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tollgate_policy::{ScopeSet, policy_for};
use tollgate_token::VerifiedToken;
use tower_http::trace::TraceLayer;

/// Build the full router for a prepared [`AppState`].
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/token", post(first_party::issue_token));

    for (name, resource) in &state.config.resources {
        let guard = Arc::new(ScopeGuard::new(
            state
                .authorizer
                .clone()
                .with_shared_policy(policy_for(resource.policy)),
            ScopeSet::new(&resource.scopes),
        ));
        let name = name.clone();
        let body = resource.body.clone();

        tracing::debug!(
            resource = %name,
            path = %resource.path,
            scopes = %guard.required,
            policy = guard.authorizer.policy_name(),
            "Mounting resource"
        );

        router = router.route(
            &resource.path,
            get(move |Extension(token): Extension<VerifiedToken>| {
                let payload = resource_body(&name, body.as_ref(), &token);
                async move { Json(payload) }
            })
            .layer(from_fn_with_state(guard, require_scopes)),
        );
    }

    let session_routes = Router::new()
        .route("/users/me", get(handlers::me))
        .route("/privileged", get(handlers::privileged))
        .route_layer(from_fn_with_state(state.clone(), require_session));
    router = router.merge(session_routes);

    if let Some(services) = &state.session {
        router = router
            .route("/login", get(delegated::login))
            .route(&services.callback_path, get(delegated::callback))
            .route("/logout", post(delegated::logout));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
