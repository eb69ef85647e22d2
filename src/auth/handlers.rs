use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
            UpdateIpRequest,
        },
        error::AuthError,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/update-ip", post(update_ip))
        .route("/change-password", post(change_password))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload.map(|Json(p)| p).map_err(|e| {
        warn!(error = %e, "rejected request body");
        AuthError::MalformedBody
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let req = body(payload)?;
    state
        .credentials
        .register(&req.fullname, &req.username, &req.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully!")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let req = body(payload)?;
    let out = state.credentials.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse {
        message: "Login successful!".into(),
        token: out.token,
        local_ip: out.local_ip,
        fullname: out.fullname,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_ip(
    State(state): State<AppState>,
    payload: Result<Json<UpdateIpRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AuthError> {
    let req = body(payload)?;
    let ip = state
        .credentials
        .update_local_ip(&req.username, req.local_ip)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AuthError::UnknownUsername,
            other => other,
        })?;
    Ok(Json(MessageResponse::new(format!(
        "IP Updated successful! to {}",
        ip.as_deref().unwrap_or("null")
    ))))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AuthError> {
    let req = body(payload)?;
    state
        .credentials
        .change_password(&req.username, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully!")))
}
