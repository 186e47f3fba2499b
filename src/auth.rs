// auth.rs
// Bearer-token authentication middleware, the platform gate, and the
// extractor handlers use to reach the current principal.

use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use mongodb::bson::oid::ObjectId;

use crate::errors::ApiError;
use crate::models::Role;
use crate::state::{
    AppState, Principal, delete_expired_session, find_principal_by_id, get_or_create_settings,
    lookup_session,
};

#[derive(Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub token: String,
}

/// Resolves `Authorization: Bearer <token>` to a principal. Failure
/// classes get distinct messages: missing/unknown token, expired token,
/// and a principal that no longer exists.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            ApiError::Unauthorized("missing bearer token".into()).into_response()
        })?;

    let session = match lookup_session(&state, &token).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return Err(
                ApiError::Unauthorized("invalid or malformed token".into()).into_response()
            );
        }
        Err(err) => return Err(ApiError::Internal(err).into_response()),
    };

    if session.expires_at.to_system_time() <= SystemTime::now() {
        delete_expired_session(&state, &token).await;
        return Err(ApiError::Unauthorized("token expired".into()).into_response());
    }

    let principal = match find_principal_by_id(&state, &session.principal_id).await {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            return Err(
                ApiError::Unauthorized("account no longer exists".into()).into_response()
            );
        }
        Err(err) => return Err(ApiError::Internal(err).into_response()),
    };

    request
        .extensions_mut()
        .insert(AuthContext { principal, token });
    Ok(next.run(request).await)
}

/// Platform gate, layered inside `require_auth` on every route except
/// login and the platform-settings endpoints. Disabled means only
/// admin-tier roles pass. A failed settings lookup fails OPEN: blocking
/// the whole application on a storage hiccup is worse than letting a
/// request through.
pub async fn require_platform(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let role = request
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.principal.role());

    match get_or_create_settings(&state).await {
        Ok(settings) if !settings.is_enabled => {
            let admin_tier = role.is_some_and(|r| r.is_admin_tier());
            if !admin_tier {
                return Err(ApiError::PlatformDisabled.into_response());
            }
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(%err, "platform settings lookup failed, letting request through");
        }
    }
    Ok(next.run(request).await)
}

/// Handler-side view of the authenticated principal.
pub struct CurrentUser(pub AuthContext);

impl CurrentUser {
    pub fn principal(&self) -> &Principal {
        &self.0.principal
    }

    pub fn principal_id(&self) -> ObjectId {
        self.0.principal.id()
    }

    pub fn role(&self) -> Role {
        self.0.principal.role()
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }

    pub fn is_admin_tier(&self) -> bool {
        self.role().is_admin_tier()
    }
}

#[allow(refining_impl_trait)]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> BoxFuture<'static, Result<Self, Self::Rejection>> {
        let context = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()).into_response());

        Box::pin(async move {
            match context {
                Ok(ctx) => Ok(CurrentUser(ctx)),
                Err(resp) => Err(resp),
            }
        })
    }
}
