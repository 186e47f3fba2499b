// routes/login.rs
// POST /login { "username": "...", "password": "..." } -> bearer token.
// POST /logout revokes the presented token.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::state::{AppState, create_session, delete_session, find_principal_by_username};

use super::rfc3339;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: &'static str,
    pub name: String,
    pub expires_at: String,
}

/// Staff store is consulted first, then executives; whichever matches
/// verifies with its own comparison (bcrypt vs. direct).
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let principal = find_principal_by_username(&state, body.username.trim())
        .await?
        .filter(|p| p.verify_credential(&body.password))
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".into()))?;

    let (token, expires_at) = create_session(&state, &principal.id()).await?;
    Ok(Json(LoginResponse {
        token,
        role: principal.role().as_str(),
        name: principal.name().to_string(),
        expires_at: rfc3339(&expires_at),
    }))
}

pub async fn logout(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    delete_session(&state, current.token()).await?;
    Ok(StatusCode::NO_CONTENT)
}
