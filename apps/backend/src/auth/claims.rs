//! Identity claims carried inside session tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::repos::users::UserRecord;

pub const CLAIM_ID: &str = "id";
pub const CLAIM_USERNAME: &str = "username";
pub const CLAIM_EMAIL: &str = "email";
pub const CLAIM_NAME: &str = "name";
pub const CLAIM_ROLE: &str = "role";
pub const CLAIM_AVATAR: &str = "avatar";
pub const CLAIM_IS_VERIFIED: &str = "is_verified";
pub const CLAIM_ISSUED_AT: &str = "iat";
pub const CLAIM_EXPIRES_AT: &str = "exp";
pub const CLAIM_NOT_BEFORE: &str = "nbf";
/// Deprecated admin flag. Read for compatibility with older tokens, never written.
pub const CLAIM_LEGACY_IS_ADMIN: &str = "is_admin";

/// Account role. `role` is the canonical admin representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

/// Claim set of a token: an arbitrary JSON object with typed accessors for
/// the identity and time claims the backend relies on.
///
/// The map is returned to callers exactly as it was encoded, so values may
/// be stale relative to the user record (a role change is only visible once
/// a new token is issued).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Identity claims for a persisted user, as placed in tokens at login.
    pub fn for_user(user: &UserRecord) -> Self {
        Self::new()
            .with(CLAIM_ID, user.id)
            .with(CLAIM_USERNAME, user.username.as_str())
            .with(CLAIM_EMAIL, user.email.as_str())
            .with(CLAIM_NAME, user.name.as_str())
            .with(CLAIM_ROLE, user.role.as_str())
            .with(CLAIM_AVATAR, user.avatar.clone())
            .with(CLAIM_IS_VERIFIED, user.is_verified)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn user_id(&self) -> Option<i64> {
        self.get(CLAIM_ID).and_then(Value::as_i64)
    }

    pub fn role(&self) -> Option<Role> {
        self.get(CLAIM_ROLE)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn email(&self) -> Option<&str> {
        self.get(CLAIM_EMAIL).and_then(Value::as_str)
    }

    pub fn username(&self) -> Option<&str> {
        self.get(CLAIM_USERNAME).and_then(Value::as_str)
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.get(CLAIM_ISSUED_AT).and_then(Value::as_i64)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.get(CLAIM_EXPIRES_AT).and_then(Value::as_i64)
    }

    /// True when `role` is `"admin"` or the legacy `is_admin` flag is `true`/`1`.
    pub fn is_admin(&self) -> bool {
        if self.role() == Some(Role::Admin) {
            return true;
        }
        match self.get(CLAIM_LEGACY_IS_ADMIN) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            _ => false,
        }
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
