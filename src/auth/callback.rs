//! Magic-link callback resolution.
//!
//! A visit to `/auth/callback` carries either a PKCE authorization code or an
//! access/refresh token pair. [`resolve_callback`] turns that visit into a
//! session plus a dashboard destination, or into one of four terminal
//! [`CallbackError`]s shown to the user as static text.

use thiserror::Error;
use url::Url;

use crate::{
    auth::{jar::SessionJar, role_router::route_role},
    models::Destination,
    services::{ProfileDirectory, SessionStore, StoreError},
};

/// Credential carried by the callback URL. Consumed exactly once.
#[derive(Clone, PartialEq, Eq)]
pub enum CallbackCredential {
    AuthorizationCode { code: String },
    TokenPair { access_token: String, refresh_token: String },
}

impl std::fmt::Debug for CallbackCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackCredential::AuthorizationCode { .. } => f.write_str("AuthorizationCode"),
            CallbackCredential::TokenPair { .. }         => f.write_str("TokenPair"),
        }
    }
}

impl CallbackCredential {
    /// `code` wins over a token pair; empty parameters count as absent.
    pub fn from_url(url: &Url) -> Option<Self> {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(code) = param("code") {
            return Some(CallbackCredential::AuthorizationCode { code });
        }
        match (param("access_token"), param("refresh_token")) {
            (Some(access_token), Some(refresh_token)) => {
                Some(CallbackCredential::TokenPair { access_token, refresh_token })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CallbackError {
    #[error("Invalid or expired link.")]
    MissingCredential,
    #[error("Authentication failed.")]
    AuthenticationFailed,
    #[error("Failed to fetch profile.")]
    ProfileMissing,
    #[error("No valid role found.")]
    UnknownRole,
}

/// Resolve one callback visit.
///
/// The steps run strictly in sequence: parse, establish, read back, profile
/// lookup, route. The only retry is a single re-exchange of the code after a
/// [`StoreError::DualCredentialConflict`], preceded by clearing the stale
/// local session.
pub async fn resolve_callback(
    url: &str,
    sessions: &dyn SessionStore,
    profiles: &dyn ProfileDirectory,
    jar: &dyn SessionJar,
) -> Result<Destination, CallbackError> {
    let credential = Url::parse(url)
        .ok()
        .as_ref()
        .and_then(CallbackCredential::from_url)
        .ok_or_else(|| {
            tracing::info!("Callback visited without a code or token pair");
            CallbackError::MissingCredential
        })?;

    tracing::debug!(?credential, "Resolving auth callback");

    let established = match &credential {
        CallbackCredential::AuthorizationCode { code } => {
            match sessions.exchange_code_for_session(jar, code).await {
                Err(StoreError::DualCredentialConflict) => {
                    tracing::warn!("Stale session conflicted with code exchange, clearing it and retrying once");
                    sessions.clear_local_session(jar).await;
                    sessions.exchange_code_for_session(jar, code).await
                }
                other => other,
            }
        }
        CallbackCredential::TokenPair { access_token, refresh_token } => {
            sessions
                .establish_session_from_tokens(jar, access_token, refresh_token)
                .await
        }
    };

    if let Err(err) = established {
        tracing::warn!(error = %err, ?credential, "Session establishment failed");
        return Err(CallbackError::AuthenticationFailed);
    }

    let session = sessions.current_session(jar).await.ok_or_else(|| {
        tracing::warn!("Exchange reported success but no session could be read back");
        CallbackError::AuthenticationFailed
    })?;

    let profile = match profiles.get_profile_by_user_id(&session.user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            tracing::warn!(user_id = %session.user_id, "No profile row for authenticated user");
            return Err(CallbackError::ProfileMissing);
        }
        Err(err) => {
            tracing::warn!(user_id = %session.user_id, error = %err, "Profile lookup failed");
            return Err(CallbackError::ProfileMissing);
        }
    };

    let destination = route_role(profile.role).ok_or_else(|| {
        tracing::warn!(user_id = %session.user_id, "Profile has no recognized role");
        CallbackError::UnknownRole
    })?;

    tracing::info!(user_id = %session.user_id, role = %profile.role, to = destination.path(), "Callback resolved");
    Ok(destination)
}
