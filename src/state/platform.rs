// state/platform.rs
// Platform settings service. The singleton document is created on first
// access, here and nowhere else.

use anyhow::Result;
use mongodb::bson::doc;

use crate::models::PlatformSettings;

use super::AppState;

/// Fetch the settings, creating the default (enabled) document if absent.
pub async fn get_or_create_settings(state: &AppState) -> Result<PlatformSettings> {
    if let Some(settings) = state.platform.find_one(doc! {}).await? {
        return Ok(settings);
    }

    let mut settings = PlatformSettings {
        id: None,
        is_enabled: true,
    };
    let res = state.platform.insert_one(&settings).await?;
    settings.id = res.inserted_id.as_object_id();
    Ok(settings)
}

pub async fn set_platform_enabled(state: &AppState, enabled: bool) -> Result<PlatformSettings> {
    // Route through get-or-create so the update always has a target.
    let settings = get_or_create_settings(state).await?;
    state
        .platform
        .update_one(
            doc! { "_id": settings.id },
            doc! { "$set": { "is_enabled": enabled } },
        )
        .await?;
    Ok(PlatformSettings {
        is_enabled: enabled,
        ..settings
    })
}
