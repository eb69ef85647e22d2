use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::auth::{dto::MessageResponse, repo::StoreError};

/// Failures of the credential operations. The `Display` text is the message
/// sent to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Fullname can only have one space between words.")]
    InvalidFullname,
    #[error("Username can only contain letters and numbers.")]
    InvalidUsername,
    #[error("Username already exists.")]
    DuplicateUsername,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("User not found.")]
    UserNotFound,
    /// Unknown user as reported by the update-ip route.
    #[error("Invalid Username.")]
    UnknownUsername,
    #[error("Old password is incorrect.")]
    InvalidOldPassword,
    #[error("Invalid request body.")]
    MalformedBody,
    #[error("Server error.")]
    Storage(#[source] StoreError),
    #[error("Server error.")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Storage(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey => AuthError::DuplicateUsername,
            StoreError::NotFound(_) => AuthError::UserNotFound,
            other => AuthError::Storage(other),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AuthError::Storage(e) => error!(error = %e, "store failure"),
            AuthError::Internal(e) => error!(error = %e, "internal failure"),
            _ => {}
        }
        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}
