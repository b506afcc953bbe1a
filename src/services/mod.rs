//! Capabilities consumed from the identity / data backend.
//!
//! Handlers and the callback resolver only ever see these traits; the
//! concrete [`supabase::SupabaseClient`] is constructed once in `main` and
//! injected through `AppState`.

pub mod supabase;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::jar::SessionJar,
    models::{NewProject, Profile, Project, ProjectUpdate, Session},
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A bearer credential and a stale stored session were presented at the
    /// same time. Clearing the local session and retrying once can succeed.
    #[error("dual-credential conflict")]
    DualCredentialConflict,
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected backend response: {0}")]
    Decode(String),
    #[error("no PKCE code verifier stored for this browser")]
    MissingVerifier,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Owner of the authentication session. The jar is the per-browser session
/// artifact; only implementations of this trait write to it.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a passwordless login: the backend emails a link that lands on
    /// `redirect_to`.
    async fn send_magic_link(&self, jar: &dyn SessionJar, email: &str, redirect_to: &str) -> StoreResult<()>;

    async fn exchange_code_for_session(&self, jar: &dyn SessionJar, code: &str) -> StoreResult<Session>;

    /// Tokens are single-use; a second call with the same pair must fail.
    async fn establish_session_from_tokens(
        &self,
        jar: &dyn SessionJar,
        access_token: &str,
        refresh_token: &str,
    ) -> StoreResult<Session>;

    /// Read failures are reported as "no session".
    async fn current_session(&self, jar: &dyn SessionJar) -> Option<Session>;

    /// Drop the locally held session tokens. Idempotent.
    async fn clear_local_session(&self, jar: &dyn SessionJar);

    async fn sign_out(&self, jar: &dyn SessionJar) -> StoreResult<()>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn get_profile_by_user_id(&self, user_id: &str) -> StoreResult<Option<Profile>>;

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    async fn list_projects_for_user(&self, user_id: &str) -> StoreResult<Vec<Project>>;

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Ownership is an equality filter on `user_id` next to the id filter.
    async fn get_project_for_user(&self, id: Uuid, user_id: &str) -> StoreResult<Option<Project>>;

    async fn create_project(&self, project: &NewProject) -> StoreResult<Project>;

    async fn update_project(&self, id: Uuid, update: &ProjectUpdate) -> StoreResult<Option<Project>>;
}

/// Admin-side magic links, mailed by this service rather than the backend.
#[async_trait]
pub trait InviteLinks: Send + Sync {
    async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> StoreResult<String>;
}
