//! Supabase-backed implementation of the store traits.
//!
//! Auth calls go to the GoTrue API (`/auth/v1`) with the anon key; table
//! access goes to PostgREST (`/rest/v1`) and admin link generation uses the
//! service-role key. One client per process, built at startup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use uuid::Uuid;

use super::{InviteLinks, ProfileDirectory, ProjectStore, SessionStore, StoreError, StoreResult};
use crate::{
    auth::{
        code_challenge, generate_code_verifier,
        jar::{SessionJar, ACCESS_TOKEN_COOKIE, CODE_VERIFIER_COOKIE, REFRESH_TOKEN_COOKIE},
    },
    config::Config,
    models::{NewProject, Profile, Project, ProjectUpdate, Role, Session},
};

const SESSION_DAYS:   i64 = 30;
// Matches the default one-hour lifetime of a Supabase magic link.
const VERIFIER_MINUTES: i64 = 60;

pub struct SupabaseClient {
    http:        reqwest::Client,
    base_url:    String,
    anon_key:    String,
    service_key: String,
}

// ── Wire types ────────────────────────────────────────────────

#[derive(Deserialize)]
struct UserResponse {
    id:    String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token:  String,
    refresh_token: String,
    expires_at:    Option<i64>,
    user:          UserResponse,
}

impl From<TokenResponse> for Session {
    fn from(t: TokenResponse) -> Self {
        Session {
            user_id:       t.user.id,
            email:         t.user.email,
            access_token:  t.access_token,
            refresh_token: t.refresh_token,
            expires_at:    t.expires_at,
        }
    }
}

#[derive(Deserialize)]
struct ProfileRow {
    id:    String,
    role:  Option<String>,
    email: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            role:  Role::from_column(row.role.as_deref()),
            id:    row.id,
            email: row.email,
        }
    }
}

#[derive(Deserialize)]
struct GenerateLinkResponse {
    action_link: String,
}

/// GoTrue and PostgREST disagree on where the human-readable message lives.
#[derive(Deserialize)]
struct ErrorBody {
    msg:               Option<String>,
    message:           Option<String>,
    error_description: Option<String>,
    error:             Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

// ── Client ────────────────────────────────────────────────────

impl SupabaseClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.supabase_timeout_secs))
            .user_agent("AdminHub/1.0")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;

        Ok(Self {
            http,
            base_url:    config.supabase_url.clone(),
            anon_key:    config.supabase_anon_key.clone(),
            service_key: config.supabase_service_role_key.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, table: &str, query: &str) -> String {
        format!("{}/rest/v1/{table}?{query}", self.base_url)
    }

    /// Auth API call made on behalf of a browser; `bearer` defaults to the anon key.
    fn public(&self, req: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key))
    }

    fn service(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn fetch_user(&self, access_token: &str) -> StoreResult<UserResponse> {
        let resp = self
            .public(self.http.get(self.auth_url("user")), Some(access_token))
            .send()
            .await?;
        decode(resp).await
    }

    async fn refresh(&self, refresh_token: &str) -> StoreResult<TokenResponse> {
        let resp = self
            .public(self.http.post(self.auth_url("token?grant_type=refresh_token")), None)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        decode(resp).await
    }

    fn persist(&self, jar: &dyn SessionJar, session: &Session) {
        jar.set(ACCESS_TOKEN_COOKIE, &session.access_token, time::Duration::days(SESSION_DAYS));
        jar.set(REFRESH_TOKEN_COOKIE, &session.refresh_token, time::Duration::days(SESSION_DAYS));
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> StoreResult<Vec<T>> {
        let resp = self
            .service(self.http.get(self.rest_url(table, query)))
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> StoreResult<T> {
    if !resp.status().is_success() {
        return Err(rejection(resp).await);
    }
    resp.json::<T>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

async fn rejection(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or(body);
    StoreError::Rejected { status, message }
}

fn eq(value: &str) -> String {
    format!("eq.{}", urlencoding::encode(value))
}

// ── Session store ─────────────────────────────────────────────

#[async_trait]
impl SessionStore for SupabaseClient {
    async fn send_magic_link(&self, jar: &dyn SessionJar, email: &str, redirect_to: &str) -> StoreResult<()> {
        let verifier = generate_code_verifier();
        let url = format!(
            "{}?redirect_to={}",
            self.auth_url("otp"),
            urlencoding::encode(redirect_to)
        );

        let resp = self
            .public(self.http.post(url), None)
            .json(&json!({
                "email": email,
                "create_user": true,
                "code_challenge": code_challenge(&verifier),
                "code_challenge_method": "s256",
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }

        jar.set(CODE_VERIFIER_COOKIE, &verifier, time::Duration::minutes(VERIFIER_MINUTES));
        tracing::debug!(email, "Magic link requested");
        Ok(())
    }

    async fn exchange_code_for_session(&self, jar: &dyn SessionJar, code: &str) -> StoreResult<Session> {
        let verifier = jar.get(CODE_VERIFIER_COOKIE).ok_or(StoreError::MissingVerifier)?;
        // A session left over from an earlier login rides along as the bearer.
        let stale = jar.get(ACCESS_TOKEN_COOKIE);

        let resp = self
            .public(self.http.post(self.auth_url("token?grant_type=pkce")), stale.as_deref())
            .json(&json!({ "auth_code": code, "code_verifier": verifier }))
            .send()
            .await?;
        if resp.status() == StatusCode::CONFLICT {
            return Err(StoreError::DualCredentialConflict);
        }

        let session: Session = decode::<TokenResponse>(resp).await?.into();
        jar.remove(CODE_VERIFIER_COOKIE);
        self.persist(jar, &session);
        tracing::info!(user_id = %session.user_id, "Code exchanged for session");
        Ok(session)
    }

    async fn establish_session_from_tokens(
        &self,
        jar: &dyn SessionJar,
        access_token: &str,
        refresh_token: &str,
    ) -> StoreResult<Session> {
        let user = self.fetch_user(access_token).await?;
        // Rotating consumes the refresh token, so a replayed pair fails here.
        let token = self.refresh(refresh_token).await?;
        if token.user.id != user.id {
            return Err(StoreError::Rejected {
                status:  401,
                message: "access and refresh token belong to different users".into(),
            });
        }

        let session: Session = token.into();
        self.persist(jar, &session);
        tracing::info!(user_id = %session.user_id, "Session established from token pair");
        Ok(session)
    }

    async fn current_session(&self, jar: &dyn SessionJar) -> Option<Session> {
        let access_token = jar.get(ACCESS_TOKEN_COOKIE)?;
        let refresh_token = jar.get(REFRESH_TOKEN_COOKIE);

        match self.fetch_user(&access_token).await {
            Ok(user) => Some(Session {
                user_id:       user.id,
                email:         user.email,
                access_token,
                refresh_token: refresh_token.unwrap_or_default(),
                expires_at:    None,
            }),
            Err(StoreError::Rejected { status: 401 | 403, .. }) => {
                let refreshed = self.refresh(refresh_token.as_deref()?).await;
                match refreshed {
                    Ok(token) => {
                        let session: Session = token.into();
                        self.persist(jar, &session);
                        tracing::debug!(user_id = %session.user_id, "Expired access token refreshed");
                        Some(session)
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "Stored session could not be refreshed");
                        None
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read current session");
                None
            }
        }
    }

    async fn clear_local_session(&self, jar: &dyn SessionJar) {
        jar.remove(ACCESS_TOKEN_COOKIE);
        jar.remove(REFRESH_TOKEN_COOKIE);
    }

    async fn sign_out(&self, jar: &dyn SessionJar) -> StoreResult<()> {
        let result = match jar.get(ACCESS_TOKEN_COOKIE) {
            Some(token) => {
                match self
                    .public(self.http.post(self.auth_url("logout")), Some(&token))
                    .send()
                    .await
                {
                    Ok(resp) if resp.status().is_success() => Ok(()),
                    // Already expired or revoked: nothing left to terminate.
                    Ok(resp) if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND) => Ok(()),
                    Ok(resp) => Err(rejection(resp).await),
                    Err(err) => Err(err.into()),
                }
            }
            None => Ok(()),
        };
        self.clear_local_session(jar).await;
        result
    }
}

// ── Profiles ──────────────────────────────────────────────────

#[async_trait]
impl ProfileDirectory for SupabaseClient {
    async fn get_profile_by_user_id(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let rows: Vec<ProfileRow> = self
            .select("profiles", &format!("id={}&select=id,role,email&limit=1", eq(user_id)))
            .await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        let rows: Vec<ProfileRow> = self
            .select("profiles", &format!("email={}&select=id,role,email&limit=1", eq(email)))
            .await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }
}

// ── Projects ──────────────────────────────────────────────────

#[async_trait]
impl ProjectStore for SupabaseClient {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.select("projects", "select=*").await
    }

    async fn list_projects_for_user(&self, user_id: &str) -> StoreResult<Vec<Project>> {
        self.select("projects", &format!("select=*&user_id={}", eq(user_id)))
            .await
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let rows: Vec<Project> = self
            .select("projects", &format!("select=*&id=eq.{id}&limit=1"))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn get_project_for_user(&self, id: Uuid, user_id: &str) -> StoreResult<Option<Project>> {
        let rows: Vec<Project> = self
            .select(
                "projects",
                &format!("select=*&id=eq.{id}&user_id={}&limit=1", eq(user_id)),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create_project(&self, project: &NewProject) -> StoreResult<Project> {
        let resp = self
            .service(self.http.post(self.rest_url("projects", "select=*")))
            .header("Prefer", "return=representation")
            .json(project)
            .send()
            .await?;
        let rows: Vec<Project> = decode(resp).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".into()))
    }

    async fn update_project(&self, id: Uuid, update: &ProjectUpdate) -> StoreResult<Option<Project>> {
        let resp = self
            .service(self.http.patch(self.rest_url("projects", &format!("id=eq.{id}&select=*"))))
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await?;
        let rows: Vec<Project> = decode(resp).await?;
        Ok(rows.into_iter().next())
    }
}

// ── Invites ───────────────────────────────────────────────────

#[async_trait]
impl InviteLinks for SupabaseClient {
    async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> StoreResult<String> {
        let resp = self
            .service(self.http.post(self.auth_url("admin/generate_link")))
            .json(&json!({
                "type": "magiclink",
                "email": email,
                "redirect_to": redirect_to,
            }))
            .send()
            .await?;
        let link: GenerateLinkResponse = decode(resp).await?;
        Ok(link.action_link)
    }
}
