//! `/admin` routes — project management and client invites.
//! All routes in this module require the `Admin` role (enforced via the
//! `require_admin` role-guard applied in `router`).

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::email::send_invite_email,
    errors::{AppError, AppResult},
    middleware::{auth_guard::AuthUser, role_guard::require_admin},
    models::{NewProject, Project, ProjectUpdate},
    services::StoreError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    use axum::middleware;
    // require_admin reads Extension<AuthUser> (injected by require_auth in mod.rs);
    // it does not need AppState, so plain from_fn is sufficient.
    let admin_guard = middleware::from_fn(require_admin);
    Router::new()
        .route("/admin/projects",      get(list_projects).post(create_project))
        .route("/admin/projects/{id}", get(get_project).put(update_project))
        .route("/admin/invite",        post(invite_client))
        .route_layer(admin_guard)
}

// ── Request bodies ───────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CreateProjectBody {
    #[validate(length(min = 1))]
    client_name:  String,
    #[validate(email)]
    client_email: String,
    #[serde(default)]
    business:     String,
    #[serde(default)]
    industry:     String,
    #[serde(default)]
    goals:        String,
    #[serde(default)]
    painpoints:   String,
    #[serde(default)]
    pages:        String,
    #[serde(default)]
    content:      String,
    #[serde(default)]
    features:     String,
    #[serde(default)]
    admin_panel:  bool,
    #[serde(default)]
    design_prefs: String,
    #[serde(default)]
    examples:     String,
    #[serde(default)]
    mood:         String,
}

#[derive(Deserialize, Validate)]
struct InviteBody {
    #[validate(email)]
    email: String,
}

// ── Handlers ─────────────────────────────────────────────────

async fn list_projects(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list_projects().await?))
}

/// POST /admin/projects — create a project linked to an existing client profile.
async fn create_project(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Json(body): Json<CreateProjectBody>,
) -> AppResult<(StatusCode, Json<Project>)> {
    body.validate()?;

    let client = state
        .profiles
        .find_profile_by_email(body.client_email.trim())
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(
                "Client not found in profiles. Make sure they are registered and have a profile.".into(),
            )
        })?;

    let new = NewProject {
        user_id:      client.id,
        client_name:  body.client_name,
        client_email: body.client_email.trim().to_owned(),
        business:     body.business,
        industry:     body.industry,
        goals:        body.goals,
        painpoints:   body.painpoints,
        pages:        body.pages,
        content:      body.content,
        features:     body.features,
        admin_panel:  body.admin_panel,
        design_prefs: body.design_prefs,
        examples:     body.examples,
        mood:         body.mood,
    };
    let project = state.projects.create_project(&new).await?;

    tracing::info!(admin = %admin.user_id, project = %project.id, client = %project.user_id, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    state
        .projects
        .get_project(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// PUT /admin/projects/{id} — edit admin notes and the client-visible progress update.
async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProjectUpdate>,
) -> AppResult<Json<Project>> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".into()));
    }
    state
        .projects
        .update_project(id, &body)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// POST /admin/invite — mail a one-click login link to a client.
async fn invite_client(
    State(state): State<AppState>,
    Json(body): Json<InviteBody>,
) -> AppResult<Json<serde_json::Value>> {
    let email = body.email.trim().to_owned();
    if email.is_empty() {
        return Err(AppError::BadRequest("E-mail is required".into()));
    }
    InviteBody { email: email.clone() }.validate()?;

    let link = state
        .invites
        .generate_magic_link(&email, &state.config.callback_url())
        .await
        .map_err(|err| match err {
            StoreError::Rejected { message, .. } => AppError::BadRequest(message),
            other => AppError::Internal(anyhow::anyhow!(other)),
        })?;
    send_invite_email(&state.config, &email, &link).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
