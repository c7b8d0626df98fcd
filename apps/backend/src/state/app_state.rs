use std::sync::Arc;

use crate::auth::token::TokenAuthority;
use crate::repos::one_time_tokens::OneTimeTokenStore;
use crate::repos::users::UserStore;
use crate::services::mailer::Mailer;

/// Application state shared by every worker.
///
/// Collaborators are injected as trait objects when the state is built;
/// nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// Session token issuer/verifier keyed with the process secret
    pub tokens: TokenAuthority,
    pub users: Arc<dyn UserStore>,
    pub one_time_tokens: Arc<dyn OneTimeTokenStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        tokens: TokenAuthority,
        users: Arc<dyn UserStore>,
        one_time_tokens: Arc<dyn OneTimeTokenStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            tokens,
            users,
            one_time_tokens,
            mailer,
        }
    }
}
