#![allow(dead_code)]

use forum_backend::auth::claims::{Claims, Role};
use forum_backend::AppState;

#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Test service with the production routes behind `RequestTrace`.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(forum_backend::middleware::RequestTrace)
                .app_data(actix_web::web::Data::new($state))
                .configure(forum_backend::routes::configure),
        )
        .await
    };
}

/// Send `$req` and collect `(status, headers, body)`.
#[macro_export]
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = actix_web::test::read_body(resp).await;
        (status, headers, body)
    }};
}

/// Token for a synthetic user, bypassing the user store.
pub fn token_for(state: &AppState, id: i64, role: Role) -> String {
    state
        .tokens
        .issue(
            Claims::new()
                .with("id", id)
                .with("username", format!("user{id}"))
                .with("role", role.as_str()),
        )
        .expect("issue token")
}
