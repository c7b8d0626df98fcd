//! Single-use tokens for email verification and password reset.
//!
//! Unlike session tokens these are opaque random strings that only mean
//! something to the store that issued them.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};

use super::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    EmailVerification,
    PasswordReset,
}

impl Purpose {
    pub fn ttl(self) -> Duration {
        match self {
            Purpose::EmailVerification => Duration::hours(24),
            Purpose::PasswordReset => Duration::hours(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OneTimeToken {
    pub token: String,
    pub user_id: i64,
    pub purpose: Purpose,
    pub expires_at: OffsetDateTime,
    pub used: bool,
}

impl OneTimeToken {
    /// Fresh random token for `user_id`, expiring after the purpose's TTL.
    pub fn generate(user_id: i64, purpose: Purpose, now: OffsetDateTime) -> Self {
        let bytes: [u8; 32] = rand::random();
        Self {
            token: hex::encode(bytes),
            user_id,
            purpose,
            expires_at: now + purpose.ttl(),
            used: false,
        }
    }
}

#[async_trait]
pub trait OneTimeTokenStore: Send + Sync {
    /// Store `token`, dropping any earlier token of the same purpose for that user.
    async fn replace_for_user(&self, token: OneTimeToken) -> Result<(), StoreError>;

    /// Redeem an unexpired, unused token and return its user id.
    ///
    /// Verification tokens are deleted; reset tokens are kept but marked used.
    async fn redeem(
        &self,
        token: &str,
        purpose: Purpose,
        now: OffsetDateTime,
    ) -> Result<Option<i64>, StoreError>;

    /// Drop every token that expired before `now`. Returns how many went.
    async fn cleanup_expired(&self, now: OffsetDateTime) -> Result<usize, StoreError>;
}

#[derive(Default)]
pub struct InMemoryOneTimeTokenStore {
    tokens: Mutex<HashMap<String, OneTimeToken>>,
}

impl InMemoryOneTimeTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }

    /// Latest token of `purpose` for `user_id`, if any.
    pub fn latest_for_user(&self, user_id: i64, purpose: Purpose) -> Option<OneTimeToken> {
        self.tokens
            .lock()
            .values()
            .find(|t| t.user_id == user_id && t.purpose == purpose)
            .cloned()
    }
}

#[async_trait]
impl OneTimeTokenStore for InMemoryOneTimeTokenStore {
    async fn replace_for_user(&self, token: OneTimeToken) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock();
        tokens.retain(|_, t| !(t.user_id == token.user_id && t.purpose == token.purpose));
        tokens.insert(token.token.clone(), token);
        Ok(())
    }

    async fn redeem(
        &self,
        token: &str,
        purpose: Purpose,
        now: OffsetDateTime,
    ) -> Result<Option<i64>, StoreError> {
        let mut tokens = self.tokens.lock();
        let user_id = match tokens.get_mut(token) {
            Some(t) if t.purpose == purpose && !t.used && t.expires_at > now => {
                t.used = true;
                t.user_id
            }
            _ => return Ok(None),
        };
        if purpose == Purpose::EmailVerification {
            tokens.remove(token);
        }
        Ok(Some(user_id))
    }

    async fn cleanup_expired(&self, now: OffsetDateTime) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.lock();
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at >= now);
        Ok(before - tokens.len())
    }
}
