//! Outgoing account emails.
//!
//! Transport and templates live outside the backend. The implementation is
//! chosen once at startup; `NoopMailer` stands in when mail is disabled.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::AppError;
use crate::logging::pii::Redacted;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), AppError>;

    async fn send_password_reset_email(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), AppError>;
}

/// Accepts every message and sends nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_verification_email(&self, _: &str, _: &str, _: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn send_password_reset_email(&self, _: &str, _: &str, _: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Site-relative link a verification email points at.
pub fn verification_link(token: &str) -> String {
    format!("/verify-email/{token}")
}

/// Site-relative link a password reset email points at.
pub fn password_reset_link(token: &str) -> String {
    format!("/reset-password/{token}")
}

/// Records each message as a structured log event. For local development:
/// the link is logged in full so the flow can be completed from the logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), AppError> {
        info!(
            event = "MAIL_VERIFICATION",
            email = %Redacted(email),
            name,
            link = %verification_link(token),
            "Verification email queued"
        );
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), AppError> {
        info!(
            event = "MAIL_PASSWORD_RESET",
            email = %Redacted(email),
            name,
            link = %password_reset_link(token),
            "Password reset email queued"
        );
        Ok(())
    }
}

/// Pick a mailer from the `MAILER` setting: `log` logs, anything else is a no-op.
pub fn mailer_from_setting(setting: Option<&str>) -> Arc<dyn Mailer> {
    if is_log_setting(setting) {
        Arc::new(LogMailer)
    } else {
        Arc::new(NoopMailer)
    }
}

fn is_log_setting(setting: Option<&str>) -> bool {
    matches!(setting.map(str::trim), Some(s) if s.eq_ignore_ascii_case("log"))
}
