// routes/doctors.rs
// Doctor directory CRUD. Phone numbers are normalized before storage.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::models::Doctor;
use crate::state::{
    AppState, create_doctor, delete_doctor, list_doctors, require_doctor, update_doctor,
};
use crate::validate::normalize_phone;

use super::{hex, parse_object_id, require_directory_manage, require_directory_read, rfc3339};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorView {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location_id: String,
    pub created_at: String,
}

impl From<Doctor> for DoctorView {
    fn from(doctor: Doctor) -> Self {
        DoctorView {
            id: hex(&doctor.id),
            name: doctor.name,
            phone: doctor.phone,
            email: doctor.email,
            location_id: doctor.location_id.to_hex(),
            created_at: rfc3339(&doctor.created_at),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorBody {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location_id: String,
}

pub async fn doctors_index(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DoctorView>>, ApiError> {
    require_directory_read(current.role())?;
    let doctors = list_doctors(&state).await?;
    Ok(Json(doctors.into_iter().map(Into::into).collect()))
}

pub async fn doctors_show(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DoctorView>, ApiError> {
    require_directory_read(current.role())?;
    let id = parse_object_id(&id, "doctor")?;
    let doctor = require_doctor(&state, &id).await?;
    Ok(Json(doctor.into()))
}

pub async fn doctors_create(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateDoctorBody>,
) -> Result<(StatusCode, Json<DoctorView>), ApiError> {
    require_directory_manage(current.role())?;
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("doctor name is required".into()));
    }
    let phone = normalize_phone(&body.phone).map_err(ApiError::Validation)?;
    let location_id = parse_object_id(&body.location_id, "location")?;
    let doctor = create_doctor(&state, body.name.trim(), &phone, body.email, &location_id).await?;
    Ok((StatusCode::CREATED, Json(doctor.into())))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location_id: Option<String>,
}

pub async fn doctors_update(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateDoctorBody>,
) -> Result<Json<DoctorView>, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "doctor")?;
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
    let doctor = update_doctor(
        &state,
        &id,
        body.name.as_deref(),
        phone.as_deref(),
        body.email.as_deref(),
        location_id.as_ref(),
    )
    .await?;
    Ok(Json(doctor.into()))
}

pub async fn doctors_delete(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_directory_manage(current.role())?;
    let id = parse_object_id(&id, "doctor")?;
    delete_doctor(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
