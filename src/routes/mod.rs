// routes/mod.rs
// Public re-exports of all route handlers plus small shared helpers.

use std::str::FromStr;

use mongodb::bson::{DateTime, oid::ObjectId};

use crate::errors::ApiError;

pub mod doctors;
pub mod executives;
pub mod locations;
pub mod login;
pub mod platform;
pub mod staff;
pub mod transactions;

pub use doctors::*;
pub use executives::*;
pub use locations::*;
pub use login::*;
pub use platform::*;
pub use staff::*;
pub use transactions::*;

/// Directory records (doctors, executives, locations, staff) are managed
/// by admin-tier roles; accountants get read access on top.
pub(crate) fn require_directory_manage(role: crate::models::Role) -> Result<(), ApiError> {
    if role.is_admin_tier() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("your role may not manage records".into()))
    }
}

pub(crate) fn require_directory_read(role: crate::models::Role) -> Result<(), ApiError> {
    if role.is_admin_tier() || role == crate::models::Role::Accountant {
        Ok(())
    } else {
        Err(ApiError::Forbidden("your role may not view records".into()))
    }
}

pub(crate) fn parse_object_id(value: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::from_str(value)
        .map_err(|_| ApiError::Validation(format!("invalid {what} id: {value}")))
}

pub(crate) fn parse_rfc3339(value: &str, what: &str) -> Result<DateTime, ApiError> {
    let parsed = chrono::DateTime::parse_from_rfc3339(value)
        .map_err(|_| ApiError::Validation(format!("invalid {what}: {value}")))?;
    Ok(DateTime::from_chrono(parsed.with_timezone(&chrono::Utc)))
}

pub(crate) fn rfc3339(value: &DateTime) -> String {
    value.try_to_rfc3339_string().unwrap_or_default()
}

pub(crate) fn hex(id: &Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}
