//! Email sending helpers.
//!
//! If SMTP is not configured (empty `smtp_host`), the link is logged instead,
//! which is enough during development without a mail server.

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::Config;
use crate::errors::{AppError, AppResult};

// ── Public helpers ────────────────────────────────────────────

/// Mail a one-click login link to a client invited by an admin.
pub async fn send_invite_email(config: &Config, to: &str, link: &str) -> AppResult<()> {
    if config.smtp_host.is_empty() {
        tracing::debug!(to, "Invite recipient");
        tracing::warn!(%link, "SMTP not configured, invite link printed here");
        return Ok(());
    }

    send(config, to, "Your AdminHub login link", &invite_body(link)).await
}

fn invite_body(link: &str) -> String {
    format!(
        "<p>Hi,</p>\
         <p>Click <a href=\"{link}\">here</a> to open your dashboard.</p>\
         <p>The link can only be used once.</p>\
         <p>AdminHub</p>"
    )
}

// ── Internal ──────────────────────────────────────────────────

async fn send(config: &Config, to: &str, subject: &str, html: &str) -> AppResult<()> {
    let email = Message::builder()
        .from(
            config.smtp_from.parse()
                .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid SMTP_FROM address")))?,
        )
        .to(to.parse().map_err(|_| AppError::BadRequest("Invalid email address".into()))?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_owned())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build email: {e}")))?;

    let creds = Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());

    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("SMTP relay error: {e}")))?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    transport
        .send(email)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to send email: {e}")))?;

    tracing::debug!(to, "Invite email sent");
    Ok(())
}
