// routes/platform.rs
// Platform settings singleton. These endpoints sit outside the gate so
// an admin can re-enable a disabled platform.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::state::{AppState, get_or_create_settings, set_platform_enabled};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettingsBody {
    pub is_enabled: bool,
}

pub async fn platform_show(
    _current: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlatformSettingsBody>, ApiError> {
    let settings = get_or_create_settings(&state).await?;
    Ok(Json(PlatformSettingsBody {
        is_enabled: settings.is_enabled,
    }))
}

pub async fn platform_update(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlatformSettingsBody>,
) -> Result<Json<PlatformSettingsBody>, ApiError> {
    if !current.is_admin_tier() {
        return Err(ApiError::Forbidden(
            "only admins may change platform settings".into(),
        ));
    }
    let settings = set_platform_enabled(&state, body.is_enabled).await?;
    Ok(Json(PlatformSettingsBody {
        is_enabled: settings.is_enabled,
    }))
}
