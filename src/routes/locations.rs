// routes/locations.rs
// Location reference CRUD.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::models::Location;
use crate::state::{
    AppState, create_location, delete_location, list_locations, require_location, update_location,
};

use super::{hex, parse_object_id, require_directory_manage, require_directory_read};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    pub id: String,
    pub name: String,
    pub address: String,
}

impl From<Location> for LocationView {
    fn from(location: Location) -> Self {
        LocationView {
            id: hex(&location.id),
            name: location.name,
            address: location.address,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateLocationBody {
    pub name: String,
    pub address: String,
}

pub async fn locations_index(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocationView>>, ApiError> {
    require_directory_read(current.role())?;
    let locations = list_locations(&state).await?;
    Ok(Json(locations.into_iter().map(Into::into).collect()))
}

pub async fn locations_show(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LocationView>, ApiError> {
    require_directory_read(current.role())?;
    let id = parse_object_id(&id, "location")?;
    let location = require_location(&state, &id).await?;
    Ok(Json(location.into()))
}

pub async fn locations_create(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateLocationBody>,
) -> Result<(StatusCode, Json<LocationView>), ApiError> {
    require_directory_manage(current.role())?;
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("location name is required".into()));
    }
    let location = create_location(&state, body.name.trim(), body.address.trim()).await?;
    Ok((StatusCode::CREATED, Json(location.into())))
}

#[derive(Deserialize, Default)]
pub struct UpdateLocationBody {
    pub name: Option<String>,
    pub address: Option<String>,
}

pub async fn locations_update(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLocationBody>,
) -> Result<Json<LocationView>, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "location")?;
    let location = update_location(&state, &id, body.name.as_deref(), body.address.as_deref()).await?;
    Ok(Json(location.into()))
}

pub async fn locations_delete(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "location")?;
    delete_location(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
