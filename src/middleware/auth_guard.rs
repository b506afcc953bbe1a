//! Authentication guard.
//!
//! Reads the session from the request cookies through the session store and
//! injects an `AuthUser` extension for downstream handlers. Visitors without a
//! session are silently redirected to the login page; that is not an error.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::{
    auth::jar::SessionJar,
    models::{Role, Session},
    services::SessionStore,
    state::AppState,
};

pub const LOGIN_PATH: &str = "/login";

/// Authenticated user extracted from a valid session. Injected into request
/// extensions by `require_auth`; downstream handlers use `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email:   Option<String>,
    pub role:    Role,
}

/// Precondition check for protected views.
///
/// Returns the current session, or calls `on_unauthenticated` exactly once and
/// hands back whatever it produced.
pub async fn require_session<R, F>(
    sessions: &dyn SessionStore,
    jar: &dyn SessionJar,
    on_unauthenticated: F,
) -> Result<Session, R>
where
    F: FnOnce() -> R,
{
    match sessions.current_session(jar).await {
        Some(session) => Ok(session),
        None => Err(on_unauthenticated()),
    }
}

/// Middleware: require a valid session, otherwise `303` to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Response {
    let jar = state.jar(cookies);

    let session = match require_session(state.sessions.as_ref(), &jar, || Redirect::to(LOGIN_PATH)).await {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };

    // A broken profile still gets through the guard; role-scoped routes
    // reject `Role::Unknown` themselves.
    let role = match state.profiles.get_profile_by_user_id(&session.user_id).await {
        Ok(Some(profile)) => profile.role,
        Ok(None) => Role::Unknown,
        Err(err) => {
            tracing::warn!(user_id = %session.user_id, error = %err, "Profile lookup failed in auth guard");
            Role::Unknown
        }
    };

    req.extensions_mut().insert(AuthUser {
        user_id: session.user_id,
        email:   session.email,
        role,
    });

    next.run(req).await
}
