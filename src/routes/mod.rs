use axum::{middleware, Router};
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::auth_guard::require_auth,
    state::AppState,
};

mod admin;
mod auth;
mod client;

/// Build the full `/api/v1` router.
///
/// Login and logout are left unprotected; every other route is wrapped in
/// the session-based [`require_auth`] middleware.
pub fn all_routes(state: AppState) -> Router<AppState> {
    let auth_mw = middleware::from_fn_with_state(state, require_auth);
    Router::new()
        .merge(auth::router())
        .merge(
            Router::new()
                .merge(auth::protected_router())
                .merge(admin::router())
                .merge(client::router())
                .route_layer(auth_mw),
        )
}

/// The whole application: API, magic-link callback and the shared layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", all_routes(state.clone()))
        .merge(auth::callback_router())
        .layer(CookieManagerLayer::new())   // must come before state
        .layer(CorsLayer::permissive())     // tighten in production
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
