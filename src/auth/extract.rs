use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{HeaderMap, COOKIE};
use axum::http::request::Parts;

use crate::storage::{DynStorage, User};
use crate::utils::error::ApiError;

use super::session::{SessionStore, SESSION_COOKIE};

/// Extractor for handlers that require an authenticated user. Rejects
/// with 401 when no valid session cookie is presented.
pub struct CurrentUser(pub User);

/// Extractor for handlers that work for both guests and signed-in users.
pub struct MaybeUser(pub Option<User>);

/// Pulls the session cookie value out of a request's Cookie headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if name == SESSION_COOKIE && !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

async fn lookup_user(parts: &Parts) -> Result<Option<User>, ApiError> {
    let sessions = parts
        .extensions
        .get::<Arc<SessionStore>>()
        .ok_or_else(|| ApiError::Internal("session store not configured".into()))?;
    let storage = parts
        .extensions
        .get::<DynStorage>()
        .ok_or_else(|| ApiError::Internal("storage not configured".into()))?
        .clone();

    let Some(cookie) = session_cookie(&parts.headers) else {
        return Ok(None);
    };
    let Some(user_id) = sessions.resolve(&cookie) else {
        return Ok(None);
    };
    Ok(storage.get_user(&user_id).await?)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match lookup_user(parts).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(ApiError::Unauthorized("Not authenticated".into())),
        }
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(lookup_user(parts).await?))
    }
}
