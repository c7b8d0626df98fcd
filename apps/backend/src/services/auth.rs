//! Account flows: registration, login, email verification and password
//! management. Handlers stay thin; everything with a side effect lives here.

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::claims::Claims;
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::error::AppError;
use crate::logging::pii::Redacted;
use crate::logging::security;
use crate::repos::one_time_tokens::{OneTimeToken, Purpose};
use crate::repos::users::{NewUser, UserRecord};
use crate::repos::StoreError;
use crate::state::app_state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_LINK: &str = "Invalid or expired link";

#[derive(Debug, Clone, Default)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub name: Option<&'a str>,
}

/// Result of a successful login: the session token and the identity claims
/// it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: Claims,
}

fn is_valid_username(username: &str) -> bool {
    !username.is_empty() && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn check_password_length(field: &str, password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        let mut errors = Map::new();
        errors.insert(
            field.to_string(),
            Value::from(format!("Must be at least {MIN_PASSWORD_LEN} characters")),
        );
        return Err(AppError::invalid_fields(
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            errors,
        ));
    }
    Ok(())
}

/// Create an account and send its verification email.
pub async fn register(state: &AppState, input: Registration<'_>) -> Result<UserRecord, AppError> {
    let username = input.username.trim();
    let email = input.email.trim();

    let mut missing = Map::new();
    for (field, value) in [("username", username), ("email", email), ("password", input.password)] {
        if value.is_empty() {
            missing.insert(field.to_string(), Value::from("This field is required"));
        }
    }
    if !missing.is_empty() {
        return Err(AppError::invalid_fields(
            "Please fill in all required fields",
            missing,
        ));
    }

    if !is_valid_username(username) {
        return Err(AppError::invalid(
            "Username may only contain letters, digits and underscores",
        ));
    }
    if !is_plausible_email(email) {
        return Err(AppError::invalid("Please enter a valid email address"));
    }
    if state.users.username_exists(username).await? {
        return Err(AppError::conflict("This username is already taken"));
    }
    if state.users.email_exists(email).await? {
        return Err(AppError::conflict("This email is already registered"));
    }
    check_password_length("password", input.password)?;

    let password_hash = hash_password(input.password)?;
    let name = input
        .name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(username);

    let user = state
        .users
        .create(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            name: name.to_string(),
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate("username") => AppError::conflict("This username is already taken"),
            StoreError::Duplicate(_) => AppError::conflict("This email is already registered"),
            other => other.into(),
        })?;

    let verification =
        OneTimeToken::generate(user.id, Purpose::EmailVerification, OffsetDateTime::now_utc());
    let token = verification.token.clone();
    state.one_time_tokens.replace_for_user(verification).await?;
    if let Err(e) = state
        .mailer
        .send_verification_email(&user.email, &user.name, &token)
        .await
    {
        // The account exists either way; verification can be re-requested.
        warn!(user_id = user.id, error = %e, "Failed to send verification email");
    }

    info!(user_id = user.id, email = %Redacted(&user.email), "User registered");
    Ok(user)
}

/// Check credentials and issue a session token from the stored user record.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::invalid("Email and password are required"));
    }

    let Some(user) = state.users.find_by_email(email).await? else {
        security::login_failed("unknown_email", Some(email));
        return Err(AppError::unauthorized_with(INVALID_CREDENTIALS));
    };

    if !verify_password(password, &user.password_hash)? {
        security::login_failed("bad_password", Some(email));
        return Err(AppError::unauthorized_with(INVALID_CREDENTIALS));
    }

    if user.is_banned {
        security::login_failed("banned", Some(email));
        return Err(AppError::forbidden_with("Your account has been suspended"));
    }

    let claims = Claims::for_user(&user);
    let token = state.tokens.issue(claims.clone())?;

    info!(user_id = user.id, "User logged in");
    Ok(LoginOutcome {
        token,
        user: claims,
    })
}

/// Fresh user record for the token's subject.
pub async fn current_user(state: &AppState, claims: &Claims) -> Result<UserRecord, AppError> {
    let id = claims.user_id().ok_or_else(AppError::unauthorized)?;
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Redeem an email verification token.
pub async fn verify_email(state: &AppState, token: &str) -> Result<(), AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::bad_request("Token is required"));
    }

    let user_id = state
        .one_time_tokens
        .redeem(token, Purpose::EmailVerification, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| AppError::bad_request(INVALID_LINK))?;

    if !state.users.mark_verified(user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id, "Email verified");
    Ok(())
}

/// Start a password reset. Succeeds whether or not the address is known so
/// callers cannot tell which addresses have accounts.
pub async fn forgot_password(state: &AppState, email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }

    let Some(user) = state.users.find_by_email(email).await? else {
        return Ok(());
    };

    let reset = OneTimeToken::generate(user.id, Purpose::PasswordReset, OffsetDateTime::now_utc());
    let token = reset.token.clone();
    state.one_time_tokens.replace_for_user(reset).await?;
    if let Err(e) = state
        .mailer
        .send_password_reset_email(&user.email, &user.name, &token)
        .await
    {
        warn!(user_id = user.id, error = %e, "Failed to send password reset email");
    }
    Ok(())
}

/// Set a new password using a reset token.
pub async fn reset_password(state: &AppState, token: &str, password: &str) -> Result<(), AppError> {
    let token = token.trim();
    if token.is_empty() || password.is_empty() {
        return Err(AppError::invalid("Token and password are required"));
    }
    check_password_length("password", password)?;
    let password_hash = hash_password(password)?;

    let user_id = state
        .one_time_tokens
        .redeem(token, Purpose::PasswordReset, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| AppError::bad_request(INVALID_LINK))?;

    if !state.users.update_password(user_id, password_hash).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id, "Password reset");
    Ok(())
}

/// Change the password of the authenticated user.
pub async fn change_password(
    state: &AppState,
    claims: &Claims,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let user = current_user(state, claims).await?;

    if user.is_banned || !verify_password(current_password, &user.password_hash)? {
        security::login_failed("bad_current_password", Some(user.email.as_str()));
        return Err(AppError::unauthorized_with("Current password is incorrect"));
    }
    check_password_length("new_password", new_password)?;

    let password_hash = hash_password(new_password)?;
    state.users.update_password(user.id, password_hash).await?;
    info!(user_id = user.id, "Password changed");
    Ok(())
}
