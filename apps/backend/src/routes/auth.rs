//! `/api/auth/*` endpoints. Each handler parses its body, calls into
//! `services::auth` and wraps the result in the success envelope.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::http::envelope;
use crate::services::auth::{self as auth_service, Registration};
use crate::state::app_state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Body value first, then the query string of the same name.
fn body_or_query(body: Option<String>, req: &HttpRequest, key: &str) -> String {
    body.filter(|v| !v.trim().is_empty())
        .or_else(|| {
            web::Query::<std::collections::HashMap<String, String>>::from_query(req.query_string())
                .ok()
                .and_then(|q| q.get(key).cloned())
        })
        .unwrap_or_default()
}

async fn register(
    app_state: web::Data<AppState>,
    body: ValidatedJson<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    auth_service::register(
        &app_state,
        Registration {
            username: &body.username,
            email: &body.email,
            password: &body.password,
            name: body.name.as_deref(),
        },
    )
    .await?;

    Ok(envelope::message(
        "Your account has been created. Please check your email to verify it.",
        StatusCode::CREATED,
    ))
}

async fn login(
    app_state: web::Data<AppState>,
    body: ValidatedJson<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = auth_service::login(&app_state, &body.email, &body.password).await?;
    Ok(envelope::success(
        Some(outcome),
        Some("Login successful"),
        StatusCode::OK,
    ))
}

/// Tokens are stateless; the client discards its copy.
async fn logout() -> HttpResponse {
    envelope::message("Logged out", StatusCode::OK)
}

async fn me(app_state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let record = auth_service::current_user(&app_state, &user).await?;
    Ok(envelope::ok(record))
}

async fn verify_email(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: ValidatedJson<TokenRequest>,
) -> Result<HttpResponse, AppError> {
    let token = body_or_query(body.into_inner().token, &req, "token");
    auth_service::verify_email(&app_state, &token).await?;
    Ok(envelope::message("Email verified", StatusCode::OK))
}

async fn forgot_password(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: ValidatedJson<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    let email = body_or_query(body.into_inner().email, &req, "email");
    auth_service::forgot_password(&app_state, &email).await?;
    Ok(envelope::message(
        "If that address is registered, a password reset link has been sent",
        StatusCode::OK,
    ))
}

async fn reset_password(
    app_state: web::Data<AppState>,
    body: ValidatedJson<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    auth_service::reset_password(&app_state, &body.token, &body.password).await?;
    Ok(envelope::message("Your password has been updated", StatusCode::OK))
}

async fn change_password(
    app_state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    auth_service::change_password(
        &app_state,
        &user,
        &body.current_password,
        &body.new_password,
    )
    .await?;
    Ok(envelope::message("Your password has been updated", StatusCode::OK))
}

async fn method_not_allowed() -> Result<HttpResponse, AppError> {
    Err(AppError::MethodNotAllowed)
}

pub async fn endpoint_not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::not_found("Endpoint not found"))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/register")
            .route(web::post().to(register))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/login")
            .route(web::post().to(login))
            .default_service(web::to(method_not_allowed)),
    )
    .service(web::resource("/logout").to(logout))
    .service(
        web::resource("/me")
            .route(web::get().to(me))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/verify-email")
            .route(web::post().to(verify_email))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/forgot-password")
            .route(web::post().to(forgot_password))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/reset-password")
            .route(web::post().to(reset_password))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/change-password")
            .route(web::post().to(change_password))
            .default_service(web::to(method_not_allowed)),
    );
}
