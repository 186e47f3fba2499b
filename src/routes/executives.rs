// routes/executives.rs
// Executive directory CRUD. Creation generates credentials, returns them
// exactly once, and best-effort texts them to the executive.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::models::Executive;
use crate::state::{
    AppState, create_executive, delete_executive, list_executives, require_executive,
    update_executive,
};
use crate::validate::normalize_phone;

use super::{hex, parse_object_id, require_directory_manage, require_directory_read, rfc3339};

/// Regular view: no credentials.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveView {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location_id: String,
    pub username: String,
    pub created_at: String,
}

impl From<Executive> for ExecutiveView {
    fn from(exec: Executive) -> Self {
        ExecutiveView {
            id: hex(&exec.id),
            name: exec.name,
            phone: exec.phone,
            email: exec.email,
            location_id: exec.location_id.to_hex(),
            username: exec.username,
            created_at: rfc3339(&exec.created_at),
        }
    }
}

/// Creation response: the one and only time the password is shown.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedExecutiveView {
    #[serde(flatten)]
    pub executive: ExecutiveView,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExecutiveBody {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location_id: String,
}

pub async fn executives_index(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ExecutiveView>>, ApiError> {
    require_directory_read(current.role())?;
    let executives = list_executives(&state).await?;
    Ok(Json(executives.into_iter().map(Into::into).collect()))
}

pub async fn executives_show(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ExecutiveView>, ApiError> {
    require_directory_read(current.role())?;
    let id = parse_object_id(&id, "executive")?;
    let exec = require_executive(&state, &id).await?;
    Ok(Json(exec.into()))
}

pub async fn executives_create(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateExecutiveBody>,
) -> Result<(StatusCode, Json<CreatedExecutiveView>), ApiError> {
    require_directory_manage(current.role())?;
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("executive name is required".into()));
    }
    let phone = normalize_phone(&body.phone).map_err(ApiError::Validation)?;
    let location_id = parse_object_id(&body.location_id, "location")?;
    let exec = create_executive(&state, body.name.trim(), &phone, body.email, &location_id).await?;

    // Credentials SMS is best-effort; the executive record is already in.
    if let Err(err) = state
        .notifier
        .send_login_sms(
            exec.phone.clone(),
            exec.username.clone(),
            exec.password.clone(),
        )
        .await
    {
        tracing::warn!(%err, "credentials sms failed");
    }

    let password = exec.password.clone();
    Ok((
        StatusCode::CREATED,
        Json(CreatedExecutiveView {
            executive: exec.into(),
            password,
        }),
    ))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExecutiveBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location_id: Option<String>,
}

pub async fn executives_update(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateExecutiveBody>,
) -> Result<Json<ExecutiveView>, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "executive")?;
    let phone = body
        .phone
        .as_deref()
        .map(normalize_phone)
        .transpose()
        .map_err(ApiError::Validation)?;
    let location_id = body
        .location_id
        .as_deref()
        .map(|v| parse_object_id(v, "location"))
        .transpose()?;
    let exec = update_executive(
        &state,
        &id,
        body.name.as_deref(),
        phone.as_deref(),
        body.email.as_deref(),
        location_id.as_ref(),
    )
    .await?;
    Ok(Json(exec.into()))
}

pub async fn executives_delete(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "executive")?;
    delete_executive(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
