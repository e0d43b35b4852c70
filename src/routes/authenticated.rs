use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind the auth middleware layer: a request with
/// no `token` cookie, or with an expired or forged token, is rejected with
/// 401 before any handler (and before any path-param validation) runs.
///
/// Access Control Strategy:
/// The layer guarantees authentication only. Finer-grained rules are
/// enforced inside handlers on the resolved `AuthUser`:
/// - category mutation: ADMIN only;
/// - ad update/delete: author or MODERATOR;
/// - response get/update/delete: strictly the original responder.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /auth/register
        // Account creation. Requires an existing valid session (inherited
        // literal contract: accounts are provisioned by the logged-in).
        .route("/auth/register", post(handlers::register))
        // --- Ads ---
        // GET /ads?categoryId=..&minPrice=..&maxPrice=..&sortByPrice=..
        // Filtered listing; invalid filter values are silently dropped.
        // POST /ads creates a listing owned by the caller.
        .route("/ads", get(handlers::get_ads).post(handlers::create_ad))
        // GET/PATCH/DELETE /ads/{id}
        // Reads for any role; mutation for the author or a MODERATOR.
        .route(
            "/ads/{id}",
            get(handlers::get_ad)
                .patch(handlers::update_ad)
                .delete(handlers::delete_ad),
        )
        // --- Categories ---
        // Reads for any role; mutation is ADMIN-only (checked in-handler).
        .route(
            "/category",
            get(handlers::get_categories).post(handlers::create_category),
        )
        .route(
            "/category/{id}",
            get(handlers::get_category)
                .patch(handlers::update_category)
                .delete(handlers::delete_category),
        )
        // --- Responses ---
        // GET /response lists only the caller's own responses.
        .route(
            "/response",
            get(handlers::get_responses).post(handlers::create_response),
        )
        // Strict ownership on single-item access: not even moderators.
        .route(
            "/response/{id}",
            get(handlers::get_response)
                .patch(handlers::update_response)
                .delete(handlers::delete_response),
        )
}
