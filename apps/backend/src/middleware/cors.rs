use std::env;

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};

use crate::auth::guards::{AUTH_TOKEN_HEADER, PROXY_AUTH_TOKEN_HEADER};

pub const CORS_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";

const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

/// Parse a comma-separated origin list, keeping only `http(s)://` entries.
/// Falls back to the local dev origins when nothing usable is configured.
pub fn parse_allowed_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(|s| s.trim_end_matches('/').to_string())
        .collect();

    if origins.is_empty() {
        DEV_ORIGINS.iter().map(|s| s.to_string()).collect()
    } else {
        origins
    }
}

/// CORS policy from `CORS_ALLOWED_ORIGINS`. Browsers may send the auth token
/// headers and read back the trace ids.
pub fn cors_middleware() -> Cors {
    let raw = env::var(CORS_ORIGINS_ENV).unwrap_or_default();

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(AUTH_TOKEN_HEADER),
            HeaderName::from_static(PROXY_AUTH_TOKEN_HEADER),
        ])
        .expose_headers(vec![
            HeaderName::from_static("x-trace-id"),
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(3600);

    for origin in parse_allowed_origins(&raw) {
        cors = cors.allowed_origin(&origin);
    }

    cors
}
