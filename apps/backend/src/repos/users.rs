//! User records and the store the auth service reads them from.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use time::OffsetDateTime;

use super::StoreError;
use crate::auth::claims::Role;

/// Persisted user. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub is_banned: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;

    /// Emails compare case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// New accounts start as unverified, unbanned `user`s.
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError>;

    /// Returns false when no such user exists.
    async fn update_password(&self, id: i64, password_hash: String) -> Result<bool, StoreError>;

    /// Returns false when no such user exists.
    async fn mark_verified(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    users: BTreeMap<i64, UserRecord>,
}

/// Process-local user store.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, id: i64, role: Role) -> bool {
        self.update(id, |user| user.role = role)
    }

    pub fn set_banned(&self, id: i64, banned: bool) -> bool {
        self.update(id, |user| user.is_banned = banned)
    }

    pub fn remove(&self, id: i64) -> Option<UserRecord> {
        self.inner.write().users.remove(&id)
    }

    fn update(&self, id: i64, f: impl FnOnce(&mut UserRecord)) -> bool {
        match self.inner.write().users.get_mut(&id) {
            Some(user) => {
                f(user);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(username)))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write();

        // Re-checked under the write lock so concurrent registrations cannot both win.
        for existing in inner.users.values() {
            if existing.username.eq_ignore_ascii_case(&new_user.username) {
                return Err(StoreError::Duplicate("username"));
            }
            if existing.email.eq_ignore_ascii_case(&new_user.email) {
                return Err(StoreError::Duplicate("email"));
            }
        }

        inner.last_id += 1;
        let record = UserRecord {
            id: inner.last_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            avatar: None,
            role: Role::User,
            is_verified: false,
            is_banned: false,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_password(&self, id: i64, password_hash: String) -> Result<bool, StoreError> {
        Ok(self.update(id, |user| user.password_hash = password_hash))
    }

    async fn mark_verified(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.update(id, |user| user.is_verified = true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Test User".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("ada", "ada@example.com")).await.unwrap();
        let b = store.create(new_user("bob", "bob@example.com")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.role, Role::User);
        assert!(!a.is_verified);
    }

    #[tokio::test]
    async fn test_duplicates_rejected_case_insensitively() {
        let store = InMemoryUserStore::new();
        store.create(new_user("ada", "ada@example.com")).await.unwrap();

        assert!(matches!(
            store.create(new_user("ADA", "other@example.com")).await,
            Err(StoreError::Duplicate("username"))
        ));
        assert!(matches!(
            store.create(new_user("other", "Ada@Example.com")).await,
            Err(StoreError::Duplicate("email"))
        ));
        assert!(store.email_exists("ADA@example.com").await.unwrap());
        assert!(store.username_exists("Ada").await.unwrap());
    }

    #[tokio::test]
    async fn test_updates() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("ada", "ada@example.com")).await.unwrap();

        assert!(store.mark_verified(user.id).await.unwrap());
        assert!(store.update_password(user.id, "new".into()).await.unwrap());
        assert!(store.set_role(user.id, Role::Admin));

        let found = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert!(found.is_verified);
        assert_eq!(found.password_hash, "new");
        assert_eq!(found.role, Role::Admin);

        assert!(!store.mark_verified(99).await.unwrap());
        assert!(store.remove(user.id).is_some());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let record = UserRecord {
            id: 1,
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "secret-hash".into(),
            name: "Ada".into(),
            avatar: None,
            role: Role::User,
            is_verified: true,
            is_banned: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
    }
}
