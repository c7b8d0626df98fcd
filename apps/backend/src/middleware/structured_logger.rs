//! Access log: one `request_completed` event per request. Server errors log
//! at error, client errors (including every auth rejection) at warn.

use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::Error as ActixError;
use futures_util::future::LocalBoxFuture;
use tracing::Level;

use super::request_trace::request_trace_id;
use crate::auth::guards::extract_from_request;

/// What the access log records about a request before it is handled.
struct AccessRecord {
    started: Instant,
    method: String,
    path: String,
    trace_id: String,
    has_token: bool,
}

impl AccessRecord {
    fn capture(req: &ServiceRequest) -> Self {
        Self {
            started: Instant::now(),
            method: req.method().to_string(),
            path: req.path().to_string(),
            trace_id: request_trace_id(req),
            has_token: extract_from_request(req.headers()).is_some(),
        }
    }

    fn finish(self, status: StatusCode) {
        let Self {
            started,
            method,
            path,
            trace_id,
            has_token,
        } = self;
        let status_code = status.as_u16();
        let duration_us = started.elapsed().as_micros() as u64;

        macro_rules! completed {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    http.method = %method,
                    url.path = %path,
                    http.status_code = status_code,
                    duration_us,
                    trace_id = %trace_id,
                    has_token,
                    "request_completed"
                )
            };
        }

        let level = completion_level(status);
        if level == Level::ERROR {
            completed!(Level::ERROR);
        } else if level == Level::WARN {
            completed!(Level::WARN);
        } else {
            completed!(Level::INFO);
        }
    }
}

fn completion_level(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}

pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let record = AccessRecord::capture(&req);
        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            record.finish(match &result {
                Ok(res) => res.status(),
                Err(err) => err.as_response_error().status_code(),
            });
            result
        })
    }
}
