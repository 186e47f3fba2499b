// routes/staff.rs
// Staff user CRUD (admin, superadmin, accountant, doctor roles).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::models::{Role, StaffUser};
use crate::state::{
    AppState, create_staff, delete_staff, get_staff_by_id, list_staff, update_staff,
    username_taken,
};

use super::{hex, parse_object_id, require_directory_manage, rfc3339};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffView {
    pub id: String,
    pub name: String,
    pub username: String,
    pub role: Role,
    pub email: Option<String>,
    pub created_at: String,
}

impl From<StaffUser> for StaffView {
    fn from(user: StaffUser) -> Self {
        StaffView {
            id: hex(&user.id),
            name: user.name,
            username: user.username,
            role: user.role,
            email: user.email,
            created_at: rfc3339(&user.created_at),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffBody {
    pub name: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub email: Option<String>,
}

pub async fn staff_index(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StaffView>>, ApiError> {
    require_directory_manage(current.role())?;
    let users = list_staff(&state).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn staff_show(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StaffView>, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "staff user")?;
    let user = get_staff_by_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("staff user {id} not found")))?;
    Ok(Json(user.into()))
}

pub async fn staff_create(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateStaffBody>,
) -> Result<(StatusCode, Json<StaffView>), ApiError> {
    require_directory_manage(current.role())?;
    let username = body.username.trim();
    if body.name.trim().is_empty() || username.is_empty() {
        return Err(ApiError::Validation("name and username are required".into()));
    }
    if body.password.len() < 6 {
        return Err(ApiError::Validation("password must be at least 6 characters".into()));
    }
    if body.role == Role::Executive {
        return Err(ApiError::Validation(
            "executives are created through /executives".into(),
        ));
    }
    // Uniqueness spans staff and executive stores jointly.
    if username_taken(&state, username).await? {
        return Err(ApiError::Conflict(format!("username '{username}' already taken")));
    }
    let id = create_staff(
        &state,
        body.name.trim(),
        username,
        &body.password,
        body.role,
        body.email,
    )
    .await?;
    let user = get_staff_by_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("staff user vanished after insert".into()))?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffBody {
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub email: Option<String>,
}

pub async fn staff_update(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStaffBody>,
) -> Result<Json<StaffView>, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "staff user")?;
    get_staff_by_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("staff user {id} not found")))?;
    if body.role == Some(Role::Executive) {
        return Err(ApiError::Validation(
            "staff users cannot become executives".into(),
        ));
    }
    update_staff(
        &state,
        &id,
        body.name.as_deref(),
        body.password.as_deref(),
        body.role,
        body.email.as_deref(),
    )
    .await?;
    let user = get_staff_by_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("staff user {id} not found")))?;
    Ok(Json(user.into()))
}

pub async fn staff_delete(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "staff user")?;
    get_staff_by_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("staff user {id} not found")))?;
    delete_staff(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
