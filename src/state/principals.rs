// state/principals.rs
// Principal resolution over the two credential stores, bearer sessions,
// and staff user CRUD.

use anyhow::{Context, Result};
use data_encoding::BASE32_NOPAD;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use rand::RngCore;
use std::time::{Duration, SystemTime};

use crate::models::{Executive, Role, Session, StaffUser};

use super::{AppState, SESSION_TTL_SECONDS};

/// An authenticated identity. The two credential stores stay independent;
/// this closed set gives them one {id, role, verify} surface.
#[derive(Debug, Clone)]
pub enum Principal {
    Staff(StaffUser),
    Executive(Executive),
}

impl Principal {
    /// Documents loaded from the store always carry `_id`; a missing one
    /// yields a fresh id that matches nothing, which denies safely.
    pub fn id(&self) -> ObjectId {
        match self {
            Principal::Staff(user) => user.id.unwrap_or_else(ObjectId::new),
            Principal::Executive(exec) => exec.id.unwrap_or_else(ObjectId::new),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Staff(user) => user.role,
            Principal::Executive(_) => Role::Executive,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::Staff(user) => &user.name,
            Principal::Executive(exec) => &exec.name,
        }
    }

    /// Staff secrets are bcrypt hashes; executive secrets are stored
    /// as issued.
    pub fn verify_credential(&self, secret: &str) -> bool {
        match self {
            Principal::Staff(user) => {
                bcrypt::verify(secret, &user.password_hash).unwrap_or(false)
            }
            Principal::Executive(exec) => exec.password == secret,
        }
    }
}

/// Ordered lookup: staff store first, then executives tagged with
/// role=executive.
pub async fn find_principal_by_username(
    state: &AppState,
    username: &str,
) -> Result<Option<Principal>> {
    if let Some(user) = state.staff.find_one(doc! { "username": username }).await? {
        return Ok(Some(Principal::Staff(user)));
    }
    if let Some(exec) = state
        .executives
        .find_one(doc! { "username": username })
        .await?
    {
        return Ok(Some(Principal::Executive(exec)));
    }
    Ok(None)
}

pub async fn find_principal_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Principal>> {
    if let Some(user) = state.staff.find_one(doc! { "_id": id }).await? {
        return Ok(Some(Principal::Staff(user)));
    }
    if let Some(exec) = state.executives.find_one(doc! { "_id": id }).await? {
        return Ok(Some(Principal::Executive(exec)));
    }
    Ok(None)
}

/// Usernames must be unique across staff and executives jointly.
pub async fn username_taken(state: &AppState, username: &str) -> Result<bool> {
    Ok(find_principal_by_username(state, username).await?.is_some())
}

pub async fn create_session(state: &AppState, principal_id: &ObjectId) -> Result<(String, DateTime)> {
    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);
    let token = BASE32_NOPAD.encode(&token_bytes);

    let expires_at =
        DateTime::from_system_time(SystemTime::now() + Duration::from_secs(SESSION_TTL_SECONDS));

    state
        .sessions
        .insert_one(Session {
            id: None,
            token: token.clone(),
            principal_id: *principal_id,
            expires_at,
        })
        .await?;

    Ok((token, expires_at))
}

pub async fn lookup_session(state: &AppState, token: &str) -> Result<Option<Session>> {
    state
        .sessions
        .find_one(doc! { "token": token })
        .await
        .map_err(Into::into)
}

pub async fn delete_session(state: &AppState, token: &str) -> Result<()> {
    let _ = state.sessions.delete_one(doc! { "token": token }).await?;
    Ok(())
}

pub async fn delete_expired_session(state: &AppState, token: &str) {
    let _ = state.sessions.delete_one(doc! { "token": token }).await;
}

// --- staff CRUD -----------------------------------------------------------

pub async fn list_staff(state: &AppState) -> Result<Vec<StaffUser>> {
    use futures::stream::TryStreamExt;
    let mut cursor = state.staff.find(doc! {}).await?;
    let mut users = Vec::new();
    while let Some(user) = cursor.try_next().await? {
        users.push(user);
    }
    Ok(users)
}

pub async fn get_staff_by_id(state: &AppState, id: &ObjectId) -> Result<Option<StaffUser>> {
    state
        .staff
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_staff(
    state: &AppState,
    name: &str,
    username: &str,
    password: &str,
    role: Role,
    email: Option<String>,
) -> Result<ObjectId> {
    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let res = state
        .staff
        .insert_one(StaffUser {
            id: None,
            name: name.to_string(),
            username: username.to_string(),
            password_hash,
            role,
            email,
            created_at: DateTime::now(),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("staff insert missing _id")
}

pub async fn update_staff(
    state: &AppState,
    id: &ObjectId,
    name: Option<&str>,
    password: Option<&str>,
    role: Option<Role>,
    email: Option<&str>,
) -> Result<()> {
    let mut set = doc! {};
    if let Some(name) = name {
        set.insert("name", name);
    }
    if let Some(password) = password {
        set.insert("password_hash", bcrypt::hash(password, bcrypt::DEFAULT_COST)?);
    }
    if let Some(role) = role {
        set.insert("role", role.as_str());
    }
    if let Some(email) = email {
        set.insert("email", email);
    }
    if set.is_empty() {
        return Ok(());
    }
    state
        .staff
        .update_one(doc! { "_id": id }, doc! { "$set": set })
        .await?;
    Ok(())
}

pub async fn delete_staff(state: &AppState, id: &ObjectId) -> Result<()> {
    state.staff.delete_one(doc! { "_id": id }).await?;
    let _ = state
        .sessions
        .delete_many(doc! { "principal_id": id })
        .await;
    Ok(())
}
