//! End-to-end account flows over the `/api/auth` routes.

#[macro_use]
mod common;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::envelope::{assert_error_envelope, assert_success_envelope};
use backend_test_support::unique_helpers::{unique_email, unique_username};
use forum_backend::auth::claims::Role;
use forum_backend::repos::one_time_tokens::{InMemoryOneTimeTokenStore, Purpose};
use forum_backend::repos::users::InMemoryUserStore;
use forum_backend::{build_state, AppState};
use serde_json::{json, Value};

struct Harness {
    state: AppState,
    users: Arc<InMemoryUserStore>,
    one_time: Arc<InMemoryOneTimeTokenStore>,
}

fn harness() -> Harness {
    let users = Arc::new(InMemoryUserStore::new());
    let one_time = Arc::new(InMemoryOneTimeTokenStore::new());
    let state = build_state()
        .with_users(users.clone())
        .with_one_time_tokens(one_time.clone())
        .build()
        .unwrap();
    Harness {
        state,
        users,
        one_time,
    }
}

fn post(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(body)
}

#[actix_web::test]
async fn test_register_login_me() {
    let h = harness();
    let app = test_app!(h.state.clone());
    let username = unique_username("reader");
    let email = unique_email("reader");

    let (status, _, body) = send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": username, "email": email, "password": "hunter22", "name": "Reader" })
        )
    );
    assert_success_envelope(status, &body, StatusCode::CREATED);

    let (status, _, body) = send!(
        app,
        post("/api/auth/login", json!({ "email": email, "password": "hunter22" }))
    );
    let data = assert_success_envelope(status, &body, StatusCode::OK);
    let token = data["token"].as_str().unwrap().to_string();
    assert_eq!(data["user"]["username"], username.as_str());
    assert_eq!(data["user"]["role"], "user");
    assert!(data["user"].get("exp").is_none());

    let (status, _, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("x-auth-token", token))
    );
    let me = assert_success_envelope(status, &body, StatusCode::OK);
    assert_eq!(me["email"], email.as_str());
    assert_eq!(me["is_verified"], false);
    assert!(me.get("password_hash").is_none());
}

#[actix_web::test]
async fn test_register_rejections() {
    let h = harness();
    let app = test_app!(h.state.clone());
    let email = unique_email("dup");

    let (status, headers, body) = send!(app, post("/api/auth/register", json!({})));
    let errors = assert_error_envelope(
        status,
        &headers,
        &body,
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .unwrap();
    for field in ["username", "email", "password"] {
        assert!(errors.get(field).is_some(), "missing error for {field}");
    }

    let (status, headers, body) = send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": "has space", "email": email, "password": "hunter22" })
        )
    );
    assert_error_envelope(status, &headers, &body, StatusCode::UNPROCESSABLE_ENTITY, None);

    let (status, _, _) = send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": "first_user", "email": email, "password": "hunter22" })
        )
    );
    assert_eq!(status, StatusCode::CREATED);

    let (status, headers, body) = send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": "second_user", "email": email, "password": "hunter22" })
        )
    );
    assert_error_envelope(status, &headers, &body, StatusCode::CONFLICT, Some("email"));

    let (status, headers, body) = send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": "first_user", "email": unique_email("other"), "password": "hunter22" })
        )
    );
    assert_error_envelope(status, &headers, &body, StatusCode::CONFLICT, Some("username"));
}

#[actix_web::test]
async fn test_login_rejections() {
    let h = harness();
    let app = test_app!(h.state.clone());
    let email = unique_email("login");

    send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": unique_username("login"), "email": email, "password": "hunter22" })
        )
    );

    let (status, headers, body) = send!(
        app,
        post("/api/auth/login", json!({ "email": email, "password": "wrong-one" }))
    );
    assert_error_envelope(
        status,
        &headers,
        &body,
        StatusCode::UNAUTHORIZED,
        Some("Invalid email or password"),
    );

    let (status, headers, body) = send!(app, post("/api/auth/login", json!({ "email": email })));
    assert_error_envelope(status, &headers, &body, StatusCode::UNPROCESSABLE_ENTITY, None);

    assert_eq!(h.one_time.len(), 1);
    h.users.set_banned(1, true);
    let (status, headers, body) = send!(
        app,
        post("/api/auth/login", json!({ "email": email, "password": "hunter22" }))
    );
    assert_error_envelope(status, &headers, &body, StatusCode::FORBIDDEN, None);
}

#[actix_web::test]
async fn test_admin_promotion_takes_effect_on_next_login() {
    let h = harness();
    let app = test_app!(h.state.clone());
    let email = unique_email("mod");

    send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": unique_username("mod"), "email": email, "password": "hunter22" })
        )
    );
    let (_, _, body) = send!(
        app,
        post("/api/auth/login", json!({ "email": email, "password": "hunter22" }))
    );
    let first: Value = serde_json::from_slice(&body).unwrap();
    let first_token = first["data"]["token"].as_str().unwrap();
    assert!(!h.state.tokens.verify(first_token).unwrap().is_admin());

    h.users.set_role(1, Role::Admin);

    let (_, _, body) = send!(
        app,
        post("/api/auth/login", json!({ "email": email, "password": "hunter22" }))
    );
    let second: Value = serde_json::from_slice(&body).unwrap();
    let claims = h
        .state
        .tokens
        .verify(second["data"]["token"].as_str().unwrap())
        .unwrap();
    assert!(claims.is_admin());
    assert_eq!(claims.user_id(), Some(1));
}

#[actix_web::test]
async fn test_verify_email() {
    let h = harness();
    let app = test_app!(h.state.clone());

    send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": unique_username("verify"), "email": unique_email("verify"), "password": "hunter22" })
        )
    );
    let pending = h
        .one_time
        .latest_for_user(1, Purpose::EmailVerification)
        .unwrap();

    let (status, headers, body) = send!(app, post("/api/auth/verify-email", json!({})));
    assert_error_envelope(status, &headers, &body, StatusCode::BAD_REQUEST, None);

    let (status, _, body) = send!(
        app,
        test::TestRequest::post().uri(&format!("/api/auth/verify-email?token={}", pending.token))
    );
    assert_success_envelope(status, &body, StatusCode::OK);

    let (status, headers, body) = send!(
        app,
        post("/api/auth/verify-email", json!({ "token": pending.token }))
    );
    assert_error_envelope(status, &headers, &body, StatusCode::BAD_REQUEST, None);
}

#[actix_web::test]
async fn test_forgot_and_reset_password() {
    let h = harness();
    let app = test_app!(h.state.clone());
    let email = unique_email("reset");

    send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": unique_username("reset"), "email": email, "password": "hunter22" })
        )
    );

    let (status, _, unknown) = send!(
        app,
        post("/api/auth/forgot-password", json!({ "email": unique_email("ghost") }))
    );
    assert_eq!(status, StatusCode::OK);
    let (status, _, known) = send!(
        app,
        post("/api/auth/forgot-password", json!({ "email": email }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown, known);

    let reset = h.one_time.latest_for_user(1, Purpose::PasswordReset).unwrap();

    let (status, headers, body) = send!(
        app,
        post("/api/auth/reset-password", json!({ "token": reset.token }))
    );
    assert_error_envelope(status, &headers, &body, StatusCode::UNPROCESSABLE_ENTITY, None);

    let (status, _, body) = send!(
        app,
        post(
            "/api/auth/reset-password",
            json!({ "token": reset.token, "password": "brand-new" })
        )
    );
    assert_success_envelope(status, &body, StatusCode::OK);

    let (status, _, _) = send!(
        app,
        post("/api/auth/login", json!({ "email": email, "password": "brand-new" }))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, headers, body) = send!(
        app,
        post(
            "/api/auth/reset-password",
            json!({ "token": reset.token, "password": "again-new" })
        )
    );
    assert_error_envelope(status, &headers, &body, StatusCode::BAD_REQUEST, None);
}

#[actix_web::test]
async fn test_change_password_requires_auth_and_current_password() {
    let h = harness();
    let app = test_app!(h.state.clone());
    let email = unique_email("change");

    send!(
        app,
        post(
            "/api/auth/register",
            json!({ "username": unique_username("change"), "email": email, "password": "hunter22" })
        )
    );
    let (_, _, body) = send!(
        app,
        post("/api/auth/login", json!({ "email": email, "password": "hunter22" }))
    );
    let login: Value = serde_json::from_slice(&body).unwrap();
    let token = login["data"]["token"].as_str().unwrap().to_string();

    let (status, headers, body) = send!(
        app,
        post(
            "/api/auth/change-password",
            json!({ "current_password": "hunter22", "new_password": "another1" })
        )
    );
    assert_error_envelope(status, &headers, &body, StatusCode::UNAUTHORIZED, None);

    let (status, headers, body) = send!(
        app,
        post(
            "/api/auth/change-password",
            json!({ "current_password": "nope", "new_password": "another1" })
        )
        .insert_header(("x-auth-token", token.clone()))
    );
    assert_error_envelope(status, &headers, &body, StatusCode::UNAUTHORIZED, None);

    let (status, _, body) = send!(
        app,
        post(
            "/api/auth/change-password",
            json!({ "current_password": "hunter22", "new_password": "another1" })
        )
        .insert_header(("x-auth-token", token))
    );
    assert_success_envelope(status, &body, StatusCode::OK);
}

#[actix_web::test]
async fn test_logout_always_succeeds() {
    let h = harness();
    let app = test_app!(h.state.clone());

    let (status, _, body) = send!(app, test::TestRequest::post().uri("/api/auth/logout"));
    assert_success_envelope(status, &body, StatusCode::OK);
}
