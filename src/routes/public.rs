use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session cookie. Note that registration is
/// *not* here: the inherited contract requires an existing valid session to
/// create an account, so /auth/register lives behind the auth layer.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Password login; sets the session cookie on success.
        .route("/auth/login", post(handlers::login))
        // POST /auth/logout
        // Clears the session cookie. Deliberately unauthenticated: logging
        // out with an already-dead session should still succeed.
        .route("/auth/logout", post(handlers::logout))
}
