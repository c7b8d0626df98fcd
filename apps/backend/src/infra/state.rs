use std::sync::Arc;

use crate::auth::token::TokenAuthority;
use crate::error::AppError;
use crate::repos::one_time_tokens::{InMemoryOneTimeTokenStore, OneTimeTokenStore};
use crate::repos::users::{InMemoryUserStore, UserStore};
use crate::services::mailer::{Mailer, NoopMailer};
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

/// Builder for creating AppState instances (used in both tests and main)
///
/// Unset collaborators fall back to in-memory stores and `NoopMailer`; an
/// unset security config gets a random secret.
pub struct StateBuilder {
    security_config: Option<SecurityConfig>,
    users: Option<Arc<dyn UserStore>>,
    one_time_tokens: Option<Arc<dyn OneTimeTokenStore>>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: None,
            users: None,
            one_time_tokens: None,
            mailer: None,
        }
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = Some(security_config);
        self
    }

    pub fn with_users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn with_one_time_tokens(mut self, store: Arc<dyn OneTimeTokenStore>) -> Self {
        self.one_time_tokens = Some(store);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn build(self) -> Result<AppState, AppError> {
        let security = self
            .security_config
            .unwrap_or_else(SecurityConfig::for_tests);
        let tokens = TokenAuthority::new(&security)?;

        Ok(AppState::new(
            tokens,
            self.users
                .unwrap_or_else(|| Arc::new(InMemoryUserStore::new())),
            self.one_time_tokens
                .unwrap_or_else(|| Arc::new(InMemoryOneTimeTokenStore::new())),
            self.mailer.unwrap_or_else(|| Arc::new(NoopMailer)),
        ))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
