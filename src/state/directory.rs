// state/directory.rs
// Doctors, executives, and locations: role-gated CRUD storage helpers
// with referential-integrity and uniqueness checks.

use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::errors::ApiError;
use crate::models::{Doctor, Executive, Location};

use super::{AppState, username_taken};

/// Reject operations citing an unknown location id.
pub async fn require_location(state: &AppState, id: &ObjectId) -> Result<Location, ApiError> {
    state
        .locations
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("location {id} not found")))
}

pub async fn require_doctor(state: &AppState, id: &ObjectId) -> Result<Doctor, ApiError> {
    state
        .doctors
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("doctor {id} not found")))
}

pub async fn require_executive(state: &AppState, id: &ObjectId) -> Result<Executive, ApiError> {
    state
        .executives
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("executive {id} not found")))
}

// --- locations ------------------------------------------------------------

pub async fn list_locations(state: &AppState) -> Result<Vec<Location>, ApiError> {
    let mut cursor = state.locations.find(doc! {}).await?;
    let mut items = Vec::new();
    while let Some(location) = cursor.try_next().await? {
        items.push(location);
    }
    Ok(items)
}

pub async fn create_location(
    state: &AppState,
    name: &str,
    address: &str,
) -> Result<Location, ApiError> {
    if state
        .locations
        .find_one(doc! { "name": name })
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!("location '{name}' already exists")));
    }
    let mut location = Location {
        id: None,
        name: name.to_string(),
        address: address.to_string(),
    };
    let res = state.locations.insert_one(&location).await?;
    location.id = res.inserted_id.as_object_id();
    Ok(location)
}

pub async fn update_location(
    state: &AppState,
    id: &ObjectId,
    name: Option<&str>,
    address: Option<&str>,
) -> Result<Location, ApiError> {
    require_location(state, id).await?;
    if let Some(name) = name {
        if state
            .locations
            .find_one(doc! { "name": name, "_id": { "$ne": id } })
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(format!("location '{name}' already exists")));
        }
    }
    let mut set = doc! {};
    if let Some(name) = name {
        set.insert("name", name);
    }
    if let Some(address) = address {
        set.insert("address", address);
    }
    if !set.is_empty() {
        state
            .locations
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
    }
    require_location(state, id).await
}

pub async fn delete_location(state: &AppState, id: &ObjectId) -> Result<(), ApiError> {
    require_location(state, id).await?;
    state.locations.delete_one(doc! { "_id": id }).await?;
    Ok(())
}

// --- doctors --------------------------------------------------------------

pub async fn list_doctors(state: &AppState) -> Result<Vec<Doctor>, ApiError> {
    let mut cursor = state.doctors.find(doc! {}).await?;
    let mut items = Vec::new();
    while let Some(doctor) = cursor.try_next().await? {
        items.push(doctor);
    }
    Ok(items)
}

/// `phone` must already be in canonical form.
pub async fn create_doctor(
    state: &AppState,
    name: &str,
    phone: &str,
    email: Option<String>,
    location_id: &ObjectId,
) -> Result<Doctor, ApiError> {
    require_location(state, location_id).await?;
    if state
        .doctors
        .find_one(doc! { "phone": phone })
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!("phone {phone} already registered")));
    }
    let mut doctor = Doctor {
        id: None,
        name: name.to_string(),
        phone: phone.to_string(),
        email,
        location_id: *location_id,
        created_at: DateTime::now(),
    };
    let res = state.doctors.insert_one(&doctor).await?;
    doctor.id = res.inserted_id.as_object_id();
    Ok(doctor)
}

pub async fn update_doctor(
    state: &AppState,
    id: &ObjectId,
    name: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
    location_id: Option<&ObjectId>,
) -> Result<Doctor, ApiError> {
    require_doctor(state, id).await?;
    if let Some(location_id) = location_id {
        require_location(state, location_id).await?;
    }
    if let Some(phone) = phone {
        if state
            .doctors
            .find_one(doc! { "phone": phone, "_id": { "$ne": id } })
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(format!("phone {phone} already registered")));
        }
    }
    let mut set = doc! {};
    if let Some(name) = name {
        set.insert("name", name);
    }
    if let Some(phone) = phone {
        set.insert("phone", phone);
    }
    if let Some(email) = email {
        set.insert("email", email);
    }
    if let Some(location_id) = location_id {
        set.insert("location_id", location_id);
    }
    if !set.is_empty() {
        state
            .doctors
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
    }
    require_doctor(state, id).await
}

pub async fn delete_doctor(state: &AppState, id: &ObjectId) -> Result<(), ApiError> {
    require_doctor(state, id).await?;
    state.doctors.delete_one(doc! { "_id": id }).await?;
    Ok(())
}

// --- executives -----------------------------------------------------------

pub async fn list_executives(state: &AppState) -> Result<Vec<Executive>, ApiError> {
    let mut cursor = state.executives.find(doc! {}).await?;
    let mut items = Vec::new();
    while let Some(exec) = cursor.try_next().await? {
        items.push(exec);
    }
    Ok(items)
}

/// Derive a username from the display name plus a random numeric suffix.
fn candidate_username(name: &str) -> String {
    let base: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '.' })
        .collect();
    let base = base.trim_matches('.').to_string();
    let suffix: u32 = rand::rng().random_range(100..1000);
    format!("{base}{suffix}")
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

/// Create an executive with generated credentials. The plaintext password
/// is only available on the returned document; it is never re-derivable.
pub async fn create_executive(
    state: &AppState,
    name: &str,
    phone: &str,
    email: Option<String>,
    location_id: &ObjectId,
) -> Result<Executive, ApiError> {
    require_location(state, location_id).await?;
    if state
        .executives
        .find_one(doc! { "phone": phone })
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!("phone {phone} already registered")));
    }

    // Usernames are unique across staff and executives jointly.
    let mut username = candidate_username(name);
    let mut attempts = 0;
    while username_taken(state, &username).await? {
        attempts += 1;
        if attempts > 10 {
            return Err(ApiError::Conflict(format!(
                "could not derive a free username for '{name}'"
            )));
        }
        username = candidate_username(name);
    }

    let mut exec = Executive {
        id: None,
        name: name.to_string(),
        phone: phone.to_string(),
        email,
        location_id: *location_id,
        username,
        password: generate_password(),
        created_at: DateTime::now(),
    };
    let res = state.executives.insert_one(&exec).await?;
    exec.id = res.inserted_id.as_object_id();
    Ok(exec)
}

pub async fn update_executive(
    state: &AppState,
    id: &ObjectId,
    name: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
    location_id: Option<&ObjectId>,
) -> Result<Executive, ApiError> {
    require_executive(state, id).await?;
    if let Some(location_id) = location_id {
        require_location(state, location_id).await?;
    }
    if let Some(phone) = phone {
        if state
            .executives
            .find_one(doc! { "phone": phone, "_id": { "$ne": id } })
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(format!("phone {phone} already registered")));
        }
    }
    let mut set = doc! {};
    if let Some(name) = name {
        set.insert("name", name);
    }
    if let Some(phone) = phone {
        set.insert("phone", phone);
    }
    if let Some(email) = email {
        set.insert("email", email);
    }
    if let Some(location_id) = location_id {
        set.insert("location_id", location_id);
    }
    if !set.is_empty() {
        state
            .executives
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
    }
    require_executive(state, id).await
}

pub async fn delete_executive(state: &AppState, id: &ObjectId) -> Result<(), ApiError> {
    require_executive(state, id).await?;
    state.executives.delete_one(doc! { "_id": id }).await?;
    let _ = state
        .sessions
        .delete_many(doc! { "principal_id": id })
        .await;
    Ok(())
}
