// state module: AppState, initialization, and re-exports of submodules.

use std::env;
use std::sync::Arc;

use anyhow::Result;
use mongodb::{Client, Collection};

use crate::models::{
    Doctor, Executive, Location, PlatformSettings, Session, StaffUser, Transaction,
};
use crate::notify::{Notifier, WebhookNotifier};

mod directory;
mod platform;
mod principals;
mod seed;
mod transactions;

pub use directory::*;
pub use platform::*;
pub use principals::*;
pub use transactions::*;

pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 24 * 7; // 7 days

#[derive(Clone)]
pub struct AppState {
    pub transactions: Collection<Transaction>,
    pub doctors: Collection<Doctor>,
    pub executives: Collection<Executive>,
    pub locations: Collection<Location>,
    pub staff: Collection<StaffUser>,
    pub sessions: Collection<Session>,
    pub platform: Collection<PlatformSettings>,
    pub notifier: Arc<dyn Notifier>,
}

pub async fn init_state() -> Result<AppState> {
    init_state_with(Arc::new(WebhookNotifier::from_env())).await
}

/// Build the state with an injected notifier (tests pass a double).
pub async fn init_state_with(notifier: Arc<dyn Notifier>) -> Result<AppState> {
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| "docreach".to_string());

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&db_name);

    let state = AppState {
        transactions: db.collection::<Transaction>("transactions"),
        doctors: db.collection::<Doctor>("doctors"),
        executives: db.collection::<Executive>("executives"),
        locations: db.collection::<Location>("locations"),
        staff: db.collection::<StaffUser>("staff"),
        sessions: db.collection::<Session>("sessions"),
        platform: db.collection::<PlatformSettings>("platform"),
        notifier,
    };

    // Only seed when the staff collection is effectively empty.
    seed::ensure_default_admin(&state).await?;

    Ok(state)
}
