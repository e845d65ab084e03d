use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::{error, warn};
use uuid::Uuid;

use super::session::SESSION_COOKIE_NAME;
use crate::{error::ApiError, state::AppState};

/// Caller identity resolved from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub session_id: String,
    pub is_superuser: bool,
    pub is_locked: bool,
    pub is_verified: bool,
}

/// True iff `caller` may act on a resource owned by `owner_id`.
pub fn can_act(caller: &Identity, owner_id: Uuid) -> bool {
    caller.is_superuser || caller.user_id == owner_id
}

/// Resolves an optional `:userId` path segment to the user being acted upon.
///
/// Callers without rights over the target are rejected before the id is
/// parsed, so a non-superuser learns nothing about other ids.
pub fn resolve_target(caller: &Identity, requested: Option<&str>) -> Result<Uuid, ApiError> {
    let Some(raw) = requested else {
        return Ok(caller.user_id);
    };
    match Uuid::parse_str(raw) {
        Ok(id) if can_act(caller, id) => Ok(id),
        Ok(_) => Err(ApiError::foreign_resource()),
        Err(_) if caller.is_superuser => Err(ApiError::Validation("Invalid user id".into())),
        Err(_) => Err(ApiError::foreign_resource()),
    }
}

/// Middleware guarding every authenticated route.
///
/// Rejects requests without a valid session, clearing stale cookies, and
/// renews the cookie of sessions whose expiry was just extended.
pub async fn require_session(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_owned()) else {
        return ApiError::Unauthenticated("No user is logged in".into()).into_response();
    };

    let session = match state.sessions.validate_session(&token).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            warn!("request with invalid or expired session");
            let jar = jar.remove(state.sessions.blank_session_cookie());
            return (
                jar,
                ApiError::Unauthenticated("No user is logged in".into()),
            )
                .into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    let (user, permission) = match state.users.find_with_permission(session.user_id).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            error!(user_id = %session.user_id, "session references a missing user");
            return ApiError::Internal("Unable to load the logged in user".into()).into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    req.extensions_mut().insert(Identity {
        user_id: user.id,
        session_id: session.id.clone(),
        is_superuser: permission.is_superuser(),
        is_locked: user.is_locked,
        is_verified: user.is_verified,
    });

    let response = next.run(req).await;

    if session.fresh && !sets_session_cookie(&response) {
        let jar = jar.add(state.sessions.session_cookie(&session));
        return (jar, response).into_response();
    }
    response
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE_NAME}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthenticated("No user is logged in".into()))
    }
}
