use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateKey,
    #[error("user {0} does not exist")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Persistent user collection keyed by username.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a new record. Fails with `DuplicateKey` when the username is
    /// taken, regardless of any earlier lookup by the caller.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    // Each setter writes a single column so concurrent updates to different
    // fields of the same user never overwrite one another.
    async fn set_token(&self, username: &str, token: &str) -> Result<User, StoreError>;

    async fn set_local_ip(
        &self,
        username: &str,
        local_ip: Option<&str>,
    ) -> Result<User, StoreError>;

    async fn set_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.into())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, username, password_hash, token, local_ip, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .map_err(backend)?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, fullname, username, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, fullname, username, password_hash, token, local_ip, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.fullname)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(u) => Ok(u),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(username = %user.username, "unique violation on insert");
                Err(StoreError::DuplicateKey)
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn set_token(&self, username: &str, token: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET token = $2
             WHERE username = $1
            RETURNING id, fullname, username, password_hash, token, local_ip, created_at
            "#,
        )
        .bind(username)
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::NotFound(username.to_owned()))
    }

    async fn set_local_ip(
        &self,
        username: &str,
        local_ip: Option<&str>,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET local_ip = $2
             WHERE username = $1
            RETURNING id, fullname, username, password_hash, token, local_ip, created_at
            "#,
        )
        .bind(username)
        .bind(local_ip)
        .fetch_optional(&self.db)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::NotFound(username.to_owned()))
    }

    async fn set_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET password_hash = $2
             WHERE username = $1
            RETURNING id, fullname, username, password_hash, token, local_ip, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::NotFound(username.to_owned()))
    }
}
