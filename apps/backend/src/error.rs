use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::token::TokenError;
use crate::http::envelope::ErrorEnvelope;
use crate::trace_ctx;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {detail}")]
    Unauthorized { detail: String },
    #[error("Forbidden: {detail}")]
    Forbidden { detail: String },
    #[error("Validation error: {detail}")]
    Validation {
        detail: String,
        errors: Option<Map<String, Value>>,
    },
    #[error("Bad request: {detail}")]
    BadRequest { detail: String },
    #[error("Not found: {detail}")]
    NotFound { detail: String },
    #[error("Conflict: {detail}")]
    Conflict { detail: String },
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Payload too large: limit {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    /// Human-readable message placed in the response envelope.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized { detail } => detail.clone(),
            AppError::Forbidden { detail } => detail.clone(),
            AppError::Validation { detail, .. } => detail.clone(),
            AppError::BadRequest { detail } => detail.clone(),
            AppError::NotFound { detail } => detail.clone(),
            AppError::Conflict { detail } => detail.clone(),
            AppError::MethodNotAllowed => "Method not allowed".to_string(),
            AppError::PayloadTooLarge { limit } => {
                format!("Request body exceeds the {limit} byte limit")
            }
            // Internal details stay in the logs.
            AppError::Internal { .. } => "Internal server error".to_string(),
            AppError::Config { .. } => "Internal server error".to_string(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            detail: "Authentication required".to_string(),
        }
    }

    pub fn unauthorized_with(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            detail: detail.into(),
        }
    }

    pub fn forbidden() -> Self {
        Self::Forbidden {
            detail: "You do not have permission to perform this action".to_string(),
        }
    }

    pub fn forbidden_with(detail: impl Into<String>) -> Self {
        Self::Forbidden {
            detail: detail.into(),
        }
    }

    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::Validation {
            detail: detail.into(),
            errors: None,
        }
    }

    /// Validation failure with a field -> message map.
    pub fn invalid_fields(detail: impl Into<String>, errors: Map<String, Value>) -> Self {
        Self::Validation {
            detail: detail.into(),
            errors: Some(errors),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest {
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound {
            detail: detail.into(),
        }
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict {
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            // Issuance failures are server-side bugs, not client errors.
            TokenError::InvalidClaims(_) => AppError::internal(format!("token issuance: {e}")),
            _ => AppError::unauthorized_with(format!("Authentication required: {e}")),
        }
    }
}

impl From<std::env::VarError> for AppError {
    fn from(e: std::env::VarError) -> Self {
        AppError::config(format!("env var error: {e}"))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let trace_id = trace_ctx::trace_id();

        if status.is_server_error() {
            tracing::error!(trace_id = %trace_id, error = %self, "request failed");
        }

        let errors = match self {
            AppError::Validation { errors, .. } => errors.clone(),
            _ => None,
        };

        HttpResponse::build(status)
            .insert_header(("x-trace-id", trace_id))
            .json(ErrorEnvelope::new(self.message(), errors))
    }
}
