#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod auth;
pub mod error;
pub mod extractors;
pub mod http;
pub mod infra;
pub mod logging;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
pub mod trace_ctx;

#[cfg(test)]
pub mod test_bootstrap;

pub use auth::claims::{Claims, Role};
pub use auth::token::{TokenAuthority, TokenError};
pub use error::AppError;
pub use extractors::{AdminUser, AuthUser, MaybeUser, ValidatedJson};
pub use infra::state::{build_state, StateBuilder};
pub use middleware::{cors_middleware, RequestTrace, StructuredLogger, TraceSpan};
pub use state::app_state::AppState;
pub use state::security_config::SecurityConfig;

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
