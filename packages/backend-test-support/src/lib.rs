//! Shared helpers for the backend's integration tests: logging bootstrap,
//! response envelope assertions and unique test data.

pub mod envelope;
pub mod logging;
pub mod unique_helpers;
