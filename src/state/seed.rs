// state/seed.rs
// First-run bootstrap: a fresh database gets one superadmin so the API
// is reachable at all.

use anyhow::{Context, Result};
use mongodb::bson::{DateTime, doc};

use crate::models::{Role, StaffUser};

use super::AppState;

pub async fn ensure_default_admin(state: &AppState) -> Result<()> {
    if state.staff.find_one(doc! {}).await?.is_some() {
        return Ok(());
    }

    let password = std::env::var("DOCREACH_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());
    let password_hash =
        bcrypt::hash(&password, bcrypt::DEFAULT_COST).context("hashing seed password")?;

    state
        .staff
        .insert_one(StaffUser {
            id: None,
            name: "Administrator".into(),
            username: "admin".into(),
            password_hash,
            role: Role::Superadmin,
            email: None,
            created_at: DateTime::now(),
        })
        .await?;
    tracing::info!("seeded default superadmin 'admin'");
    Ok(())
}
