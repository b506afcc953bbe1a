//! Shared application state — injected into every handler via `axum::extract::State`.

use std::sync::Arc;

use tower_cookies::Cookies;

use crate::{
    auth::jar::CookieJar,
    config::Config,
    services::{InviteLinks, ProfileDirectory, ProjectStore, SessionStore},
};

/// Application-wide state passed via axum `State<AppState>`.
///
/// The backend capabilities are trait objects so tests can swap in an
/// in-memory backend. In production all four point at the same
/// `SupabaseClient`.
#[derive(Clone)]
pub struct AppState {
    pub config:   Config,
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileDirectory>,
    pub projects: Arc<dyn ProjectStore>,
    pub invites:  Arc<dyn InviteLinks>,
}

impl AppState {
    pub fn new<B>(config: Config, backend: Arc<B>) -> Self
    where
        B: SessionStore + ProfileDirectory + ProjectStore + InviteLinks + 'static,
    {
        Self {
            config,
            sessions: backend.clone(),
            profiles: backend.clone(),
            projects: backend.clone(),
            invites:  backend,
        }
    }

    /// Session jar over this request's cookies. Cookies are `Secure` outside
    /// development.
    pub fn jar(&self, cookies: Cookies) -> CookieJar {
        CookieJar::new(cookies, !self.config.is_development())
    }
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "SUPABASE_URL"              => Some("http://supabase.test".into()),
        "SUPABASE_ANON_KEY"         => Some("anon".into()),
        "SUPABASE_SERVICE_ROLE_KEY" => Some("service".into()),
        _ => None,
    })
    .expect("test config")
}

#[cfg(test)]
pub fn test_state(backend: Arc<crate::services::fake::FakeBackend>) -> AppState {
    AppState::new(test_config(), backend)
}
