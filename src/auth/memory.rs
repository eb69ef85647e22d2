use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

/// In-process store used by tests and `AppState::fake`.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    async fn update<F>(&self, username: &str, apply: F) -> Result<User, StoreError>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(username.to_owned()))?;
        apply(stored);
        Ok(stored.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::DuplicateKey);
        }
        let record = User {
            id: Uuid::new_v4(),
            fullname: user.fullname,
            username: user.username,
            password_hash: user.password_hash,
            token: None,
            local_ip: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(record.username.clone(), record.clone());
        Ok(record)
    }

    async fn set_token(&self, username: &str, token: &str) -> Result<User, StoreError> {
        self.update(username, |u| u.token = Some(token.to_owned())).await
    }

    async fn set_local_ip(
        &self,
        username: &str,
        local_ip: Option<&str>,
    ) -> Result<User, StoreError> {
        self.update(username, |u| u.local_ip = local_ip.map(str::to_owned))
            .await
    }

    async fn set_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        self.update(username, |u| u.password_hash = password_hash.to_owned())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            fullname: "Jane Doe".into(),
            username: username.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_username() {
        let store = MemoryUserStore::new();
        store.create(new_user("jane")).await.expect("first insert");
        let err = store.create(new_user("jane")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn setters_touch_only_their_column() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("jane")).await.unwrap();

        store.set_local_ip("jane", Some("10.0.0.5")).await.unwrap();
        store.set_token("jane", "abc").await.unwrap();
        store.set_password_hash("jane", "rehashed").await.unwrap();

        let found = store.find_by_username("jane").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.local_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(found.token.as_deref(), Some("abc"));
        assert_eq!(found.password_hash, "rehashed");
        assert_eq!(found.fullname, "Jane Doe");

        let cleared = store.set_local_ip("jane", None).await.unwrap();
        assert!(cleared.local_ip.is_none());
        assert_eq!(cleared.password_hash, "rehashed");
    }

    #[tokio::test]
    async fn setters_on_unknown_user_are_not_found() {
        let store = MemoryUserStore::new();
        store.create(new_user("jane")).await.unwrap();
        let err = store.set_token("ghost", "abc").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref name) if name == "ghost"));
        let err = store.set_local_ip("ghost", None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
