//! Role-based guards for the two dashboard areas.
//!
//! Both read `Extension<AuthUser>`, so they must sit inside `require_auth`.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::middleware::auth_guard::AuthUser;
use crate::models::Role;

/// Middleware: require the `Admin` role.
pub async fn require_admin(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if user.role != Role::Admin {
        tracing::info!(user_id = %user.user_id, role = %user.role, "Admin area refused");
        return Err(AppError::Forbidden);
    }
    Ok(next.run(req).await)
}

/// Middleware: require the `Client` role.
pub async fn require_client(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if user.role != Role::Client {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(req).await)
}
