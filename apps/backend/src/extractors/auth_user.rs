//! Request extractors wrapping the authorization guards.
//!
//! A handler that takes `AuthUser` or `AdminUser` never runs for a caller
//! that fails the check; the extractor error is the response.

use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::auth::claims::Claims;
use crate::auth::guards::{authenticate_optional, require_admin, require_authenticated};
use crate::error::AppError;
use crate::state::app_state::AppState;

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::internal("AppState not available"))
}

/// Verified claims of an authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// Verified claims of a caller whose token grants admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

/// Claims when a valid token was sent, otherwise `None`. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Claims>);

impl AuthUser {
    pub fn into_inner(self) -> Claims {
        self.0
    }
}

impl Deref for AuthUser {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

impl Deref for AdminUser {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            app_state(req)
                .and_then(|state| require_authenticated(req.headers(), &state.tokens))
                .map(AuthUser),
        )
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            app_state(req)
                .and_then(|state| require_admin(req.headers(), &state.tokens))
                .map(AdminUser),
        )
    }
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            app_state(req).map(|state| MaybeUser(authenticate_optional(req.headers(), &state.tokens))),
        )
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    use super::*;
    use crate::auth::claims::Role;
    use crate::infra::state::build_state;

    fn data() -> web::Data<AppState> {
        web::Data::new(build_state().build().unwrap())
    }

    fn token_for(state: &AppState, role: Role) -> String {
        state
            .tokens
            .issue(Claims::new().with("id", 9).with("role", role.as_str()))
            .unwrap()
    }

    #[actix_web::test]
    async fn test_auth_user_accepts_valid_token() {
        let data = data();
        let token = token_for(&data, Role::User);
        let req = TestRequest::default()
            .app_data(data.clone())
            .insert_header(("x-auth-token", token))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.user_id(), Some(9));
    }

    #[actix_web::test]
    async fn test_admin_user_rejects_plain_user() {
        let data = data();
        let token = token_for(&data, Role::User);
        let req = TestRequest::default()
            .app_data(data.clone())
            .insert_header(("x-auth-token", token))
            .to_http_request();

        let err = AdminUser::extract(&req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_missing_state_is_internal_error() {
        let req = TestRequest::default().to_http_request();
        let err = AuthUser::extract(&req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_maybe_user_ignores_bad_token() {
        let data = data();
        let req = TestRequest::default()
            .app_data(data.clone())
            .insert_header(("x-auth-token", "garbage"))
            .to_http_request();

        let maybe = MaybeUser::extract(&req).await.unwrap();
        assert!(maybe.0.is_none());
    }
}
