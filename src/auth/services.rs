use std::sync::Arc;

use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::{
    auth::{
        error::AuthError,
        password,
        repo::{StoreError, UserStore},
        repo_types::NewUser,
    },
    config::HashConfig,
};

/// Random bytes per login token (hex-encoded to twice as many characters).
const TOKEN_BYTES: usize = 15;

lazy_static! {
    static ref FULLNAME_RE: Regex = Regex::new(r"^[A-Za-z]+ ?[A-Za-z]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
}

pub(crate) fn is_valid_fullname(fullname: &str) -> bool {
    FULLNAME_RE.is_match(fullname)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub(crate) fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// What a successful login hands back to the caller.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub local_ip: Option<String>,
    pub fullname: String,
}

/// Register, login, update-ip and change-password over an injected store.
pub struct CredentialService {
    store: Arc<dyn UserStore>,
    hash: HashConfig,
}

impl CredentialService {
    pub fn new(store: Arc<dyn UserStore>, hash: HashConfig) -> Self {
        Self { store, hash }
    }

    async fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let plain = plain.to_owned();
        let cfg = self.hash;
        tokio::task::spawn_blocking(move || password::hash_password(&plain, cfg))
            .await
            .map_err(|e| AuthError::Internal(e.into()))?
            .map_err(AuthError::Internal)
    }

    async fn verify(&self, plain: &str, hash: &str) -> Result<bool, AuthError> {
        let plain = plain.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.into()))?
            .map_err(AuthError::Internal)
    }

    pub async fn register(
        &self,
        fullname: &str,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if !is_valid_fullname(fullname) {
            warn!(%fullname, "invalid fullname");
            return Err(AuthError::InvalidFullname);
        }
        if !is_valid_username(username) {
            warn!(%username, "invalid username");
            return Err(AuthError::InvalidUsername);
        }

        if self.store.find_by_username(username).await?.is_some() {
            warn!(%username, "username already registered");
            return Err(AuthError::DuplicateUsername);
        }

        let password_hash = self.hash(password).await?;
        // The store's unique constraint settles concurrent registrations.
        let user = self
            .store
            .create(NewUser {
                fullname: fullname.to_owned(),
                username: username.to_owned(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            warn!(%username, "login unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(password, &user.password_hash).await? {
            warn!(%username, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        let user = self.store.set_token(username, &token).await?;

        info!(user_id = %user.id, %username, "user logged in");
        Ok(LoginOutcome {
            token,
            local_ip: user.local_ip,
            fullname: user.fullname,
        })
    }

    /// Stores `local_ip` verbatim and returns the stored value.
    pub async fn update_local_ip(
        &self,
        username: &str,
        local_ip: Option<String>,
    ) -> Result<Option<String>, AuthError> {
        let user = match self.store.set_local_ip(username, local_ip.as_deref()).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                warn!(%username, "update-ip unknown username");
                return Err(AuthError::UserNotFound);
            }
            Err(e) => return Err(e.into()),
        };
        debug!(%username, local_ip = ?user.local_ip, "local ip updated");
        Ok(user.local_ip)
    }

    pub async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            warn!(%username, "change-password unknown username");
            return Err(AuthError::UserNotFound);
        };

        if !self.verify(old_password, &user.password_hash).await? {
            warn!(%username, "change-password wrong old password");
            return Err(AuthError::InvalidOldPassword);
        }

        let password_hash = self.hash(new_password).await?;
        self.store.set_password_hash(username, &password_hash).await?;
        info!(%username, "password changed");
        Ok(())
    }
}
