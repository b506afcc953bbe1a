//! `/client` routes — a client's own projects. Ownership is the `user_id`
//! equality filter passed to the project store.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    middleware::{auth_guard::AuthUser, role_guard::require_client},
    models::Project,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/client/projects",      get(list_own_projects))
        .route("/client/projects/{id}", get(get_own_project))
        .route_layer(middleware::from_fn(require_client))
}

async fn list_own_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Project>>> {
    let projects = state.projects.list_projects_for_user(&user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, count = projects.len(), "Client projects loaded");
    Ok(Json(projects))
}

async fn get_own_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    state
        .projects
        .get_project_for_user(id, &user.user_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}
