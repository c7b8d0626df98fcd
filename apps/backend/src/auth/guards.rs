//! Authorization guards.
//!
//! Guards return `Result`s; the request extractors in
//! `crate::extractors::auth_user` turn a failure into the terminal 401/403
//! response before any handler code runs.

use actix_web::http::header::HeaderMap;
use tracing::debug;

use crate::auth::claims::Claims;
use crate::auth::token::TokenAuthority;
use crate::error::AppError;
use crate::logging::security;

/// Header clients send the session token in.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";
/// The same header after a rewriting reverse proxy has renamed it.
pub const PROXY_AUTH_TOKEN_HEADER: &str = "redirect-x-auth-token";

/// Find the raw token value, checking the primary header first.
pub fn extract_from_request(headers: &HeaderMap) -> Option<String> {
    [AUTH_TOKEN_HEADER, PROXY_AUTH_TOKEN_HEADER]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Require a valid token. Any failure is a 401.
pub fn require_authenticated(
    headers: &HeaderMap,
    tokens: &TokenAuthority,
) -> Result<Claims, AppError> {
    let token = extract_from_request(headers).ok_or_else(|| {
        debug!("No auth token header present");
        AppError::unauthorized()
    })?;

    tokens.verify(&token).map_err(|e| {
        security::token_rejected(&e);
        AppError::from(e)
    })
}

/// Require a valid token whose claims grant admin. Non-admins get a 403.
pub fn require_admin(headers: &HeaderMap, tokens: &TokenAuthority) -> Result<Claims, AppError> {
    let claims = require_authenticated(headers, tokens)?;
    if !claims.is_admin() {
        security::admin_denied(claims.user_id());
        return Err(AppError::forbidden());
    }
    Ok(claims)
}

/// Claims when a valid token is present; `None` for anonymous callers or
/// tokens that fail verification.
pub fn authenticate_optional(headers: &HeaderMap, tokens: &TokenAuthority) -> Option<Claims> {
    let token = extract_from_request(headers)?;
    match tokens.verify(&token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(reason = %e, "Ignoring invalid token on optional-auth path");
            None
        }
    }
}
