//! Uniform JSON response envelope.
//!
//! Every endpoint answers with `{"success": bool, ...}`: successes may carry
//! `message` and `data`, failures always carry `message` and optionally a
//! field -> message `errors` map.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Map<String, Value>>,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, errors: Option<Map<String, Value>>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl Pagination {
    /// `page` is 1-based; `per_page` of zero is treated as one.
    pub fn new(total: u64, page: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        Self {
            total,
            page,
            per_page,
            total_pages: total.div_ceil(per_page),
            has_more: page.saturating_mul(per_page) < total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedEnvelope<T: Serialize> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

pub fn success<T: Serialize>(data: Option<T>, message: Option<&str>, status: StatusCode) -> HttpResponse {
    HttpResponse::build(status).json(SuccessEnvelope {
        success: true,
        message: message.map(str::to_string),
        data,
    })
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    success(Some(data), None, StatusCode::OK)
}

/// Success with only a message and no `data` key.
pub fn message(message: &str, status: StatusCode) -> HttpResponse {
    success::<Value>(None, Some(message), status)
}

pub fn paginated<T: Serialize>(items: Vec<T>, total: u64, page: u64, per_page: u64) -> HttpResponse {
    HttpResponse::Ok().json(PaginatedEnvelope {
        success: true,
        data: items,
        pagination: Pagination::new(total, page, per_page),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use serde_json::json;

    use super::*;

    async fn body_json(resp: HttpResponse) -> Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_success_omits_absent_fields() {
        let resp = message("Logged out", StatusCode::OK);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({"success": true, "message": "Logged out"})
        );

        let resp = ok(json!({"id": 1}));
        assert_eq!(
            body_json(resp).await,
            json!({"success": true, "data": {"id": 1}})
        );
    }

    #[actix_web::test]
    async fn test_paginated_shape() {
        let resp = paginated(vec![1, 2], 5, 1, 2);
        assert_eq!(
            body_json(resp).await,
            json!({
                "success": true,
                "data": [1, 2],
                "pagination": {
                    "total": 5,
                    "page": 1,
                    "per_page": 2,
                    "total_pages": 3,
                    "has_more": true
                }
            })
        );
    }

    #[test]
    fn test_pagination_last_page() {
        let p = Pagination::new(4, 2, 2);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_more);

        let empty = Pagination::new(0, 1, 0);
        assert_eq!(empty.per_page, 1);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }

    #[test]
    fn test_error_envelope_serialization() {
        let body = serde_json::to_value(ErrorEnvelope::new("nope", None)).unwrap();
        assert_eq!(body, json!({"success": false, "message": "nope"}));
    }
}
