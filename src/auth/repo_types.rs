use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // storage key, never returned to clients
    pub fullname: String,
    pub username: String,           // unique, immutable
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 PHC string, not exposed in JSON
    pub token: Option<String>,      // last issued login token
    pub local_ip: Option<String>,   // last reported client address
    pub created_at: OffsetDateTime,
}

/// Fields supplied when inserting a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub username: String,
    pub password_hash: String,
}
