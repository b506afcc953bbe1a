use axum::{
    extract::{Extension, OriginalUri, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use validator::Validate;

use crate::{
    auth::callback::{resolve_callback, CallbackError},
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
    services::StoreError,
    state::AppState,
};

// ── Request / response types ──────────────────────────────────

#[derive(Deserialize, Validate)]
struct LoginRequest {
    #[validate(email)]
    email: String,
}

#[derive(Serialize)]
struct MeResponse {
    id:    String,
    email: Option<String>,
    role:  String,
}

// ── Routers ───────────────────────────────────────────────────

/// Public `/api/v1/auth` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/magic-link", post(send_magic_link))
        .route("/auth/logout",     post(logout))
}

/// `/api/v1/auth` routes that sit behind `require_auth`.
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// The browser-facing landing page of every magic link.
pub fn callback_router() -> Router<AppState> {
    Router::new().route("/auth/callback", get(callback))
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /auth/magic-link — email a one-time login link.
async fn send_magic_link(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = body.email.trim().to_owned();
    LoginRequest { email: email.clone() }.validate()?;

    let jar = state.jar(cookies);
    state
        .sessions
        .send_magic_link(&jar, &email, &state.config.callback_url())
        .await
        .map_err(|err| match err {
            StoreError::Rejected { message, .. } => AppError::BadRequest(format!("Error: {message}")),
            other => AppError::Internal(anyhow::anyhow!(other)),
        })?;

    Ok(Json(serde_json::json!({ "message": "Check your email for the magic link." })))
}

/// Implicit-flow links (admin invites) carry the token pair in the URL
/// fragment, which browsers never send. This page moves it into the query
/// and reloads; without a fragment it is the plain "invalid link" page.
fn fragment_relay_page() -> String {
    format!(
        "<p class=\"callback-error\">{}</p>\
         <script>if (location.hash.length > 1) \
         {{ location.replace(location.pathname + '?' + location.hash.slice(1)); }}</script>",
        CallbackError::MissingCredential
    )
}

/// GET /auth/callback — redeem the magic link and send the user to their dashboard.
async fn callback(
    State(state): State<AppState>,
    cookies: Cookies,
    OriginalUri(uri): OriginalUri,
) -> Response {
    if uri.query().unwrap_or("").is_empty() {
        return (StatusCode::BAD_REQUEST, Html(fragment_relay_page())).into_response();
    }

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/auth/callback");
    let url = format!("{}{path_and_query}", state.config.app_base_url);
    let jar = state.jar(cookies);

    match resolve_callback(&url, state.sessions.as_ref(), state.profiles.as_ref(), &jar).await {
        Ok(destination) => Redirect::to(destination.path()).into_response(),
        Err(err) => {
            let status = match err {
                CallbackError::MissingCredential    => StatusCode::BAD_REQUEST,
                CallbackError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
                CallbackError::ProfileMissing
                | CallbackError::UnknownRole        => StatusCode::FORBIDDEN,
            };
            (status, Html(format!("<p class=\"callback-error\">{err}</p>"))).into_response()
        }
    }
}

/// POST /auth/logout — end the session, locally and at the backend.
async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
) -> StatusCode {
    let jar = state.jar(cookies);
    if let Err(err) = state.sessions.sign_out(&jar).await {
        tracing::warn!(error = %err, "Backend sign-out failed; local session cleared anyway");
    }
    StatusCode::NO_CONTENT
}

/// GET /auth/me — the currently logged-in user.
async fn me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        id:    user.user_id,
        email: user.email,
        role:  user.role.to_string(),
    })
}
