//! Storage collaborators consumed by the auth service.
//!
//! Persistence engines are external; the backend only depends on these
//! traits. The in-memory implementations back local runs and tests.

use thiserror::Error;

use crate::error::AppError;

pub mod one_time_tokens;
pub mod users;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(what) => AppError::conflict(format!("This {what} is already in use")),
            StoreError::Unavailable(detail) => AppError::internal(format!("store error: {detail}")),
        }
    }
}
