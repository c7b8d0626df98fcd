use tracing::warn;

use crate::auth::token::TokenError;
use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Log a security-relevant login failure event.
pub fn login_failed(reason: &str, email: Option<&str>) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_LOGIN_FAILED",
        %trace_id,
        email = %email.map(Redacted).unwrap_or(Redacted("")),
        reason,
        "Authentication failure"
    );
}

/// Log a presented token that failed verification.
pub fn token_rejected(reason: &TokenError) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_TOKEN_REJECTED",
        %trace_id,
        reason = %reason,
        "Token verification failed"
    );
}

/// Log an authenticated caller hitting an admin-only operation.
pub fn admin_denied(user_id: Option<i64>) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_ADMIN_DENIED",
        %trace_id,
        user_id = ?user_id,
        "Admin privileges required"
    );
}
