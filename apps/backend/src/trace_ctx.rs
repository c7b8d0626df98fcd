//! Task-local trace id for the request being served.
//!
//! `RequestTrace` opens the scope; error rendering and security logs read
//! from it so responses and log lines carry the same id.

use std::cell::RefCell;
use std::future::Future;

use tokio::task_local;

/// Reported when no request scope is active.
pub const UNKNOWN_TRACE_ID: &str = "unknown";

task_local! {
    static TRACE_ID: RefCell<Option<String>>;
}

/// Trace id of the current request, or `"unknown"` outside one.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
        .unwrap_or_else(|| UNKNOWN_TRACE_ID.to_string())
}

/// Run `future` with `trace_id` visible to everything it awaits.
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: Future<Output = R>,
{
    TRACE_ID.scope(RefCell::new(Some(trace_id)), future).await
}
