use std::fmt;

use tracing::warn;

use crate::error::AppError;

/// Environment variable holding the token signing secret.
pub const TOKEN_SECRET_ENV: &str = "BACKEND_TOKEN_SECRET";

const RECOMMENDED_SECRET_LEN: usize = 32;

/// Process-wide token signing configuration. Loaded once at startup and
/// never mutated afterwards.
#[derive(Clone)]
pub struct SecurityConfig {
    token_secret: Vec<u8>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}

impl SecurityConfig {
    /// Create a new SecurityConfig with the given signing secret
    pub fn new(token_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            token_secret: token_secret.into(),
        }
    }

    /// Read the secret from `BACKEND_TOKEN_SECRET`.
    ///
    /// A missing or empty secret is a configuration error; a short one is
    /// accepted with a warning.
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var(TOKEN_SECRET_ENV)
            .map_err(|_| AppError::config(format!("{TOKEN_SECRET_ENV} must be set")))?;
        Self::from_secret(secret)
    }

    pub fn from_secret(secret: String) -> Result<Self, AppError> {
        if secret.trim().is_empty() {
            return Err(AppError::config(format!(
                "{TOKEN_SECRET_ENV} must not be empty"
            )));
        }
        if secret.len() < RECOMMENDED_SECRET_LEN {
            warn!(
                length = secret.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "Token secret is shorter than recommended"
            );
        }
        Ok(Self::new(secret.into_bytes()))
    }

    pub fn token_secret(&self) -> &[u8] {
        &self.token_secret
    }

    /// Random secret for tests that do not care about the key.
    pub fn for_tests() -> Self {
        let secret: [u8; 32] = rand::random();
        Self::new(secret.to_vec())
    }
}
