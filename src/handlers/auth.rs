use std::sync::Arc;

use axum::http::header::{HeaderMap, SET_COOKIE};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::auth::password::{hash_password, verify_login};
use crate::auth::{session_cookie, CurrentUser, SessionStore};
use crate::config::Settings;
use crate::storage::{DynStorage, NewAdvocate, NewUser, PublicUser, Role};
use crate::utils::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

pub async fn register(
    Extension(storage): Extension<DynStorage>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    body.validate().map_err(ApiError::from_validation)?;
    if body.role == Role::Admin {
        return Err(ApiError::BadRequest("Invalid role".into()));
    }

    if storage.get_user_by_username(&body.username).await?.is_some() {
        return Err(ApiError::Conflict("Username already exists".into()));
    }
    if storage.get_user_by_email(&body.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let hashed = hash_password(&body.password)
        .map_err(|e| ApiError::Internal(format!("password hash failed: {}", e)))?;

    let user = storage
        .create_user(NewUser {
            username: body.username,
            password: hashed,
            email: body.email,
            full_name: body.full_name.clone(),
            phone: body.phone,
            role: body.role,
        })
        .await?;

    // Advocates get a placeholder profile against the first known
    // location; they complete it after verification.
    if body.role == Role::Advocate {
        if let Some(location) = storage.all_locations().await?.first() {
            storage
                .create_advocate(NewAdvocate {
                    user_id: user.id.clone(),
                    location_id: location.id.clone(),
                    bio: format!("Advocate profile for {}", body.full_name),
                    experience: 0,
                    bar_council_number: "Not verified".into(),
                    image_url: None,
                    verified: false,
                })
                .await?;
        }
    }

    tracing::info!(user_id = %user.id, "user registered");
    let body = Json(json!({
        "success": true,
        "message": "User registered successfully",
        "user": PublicUser::from(user),
    }));
    Ok((axum::http::StatusCode::CREATED, body).into_response())
}

pub async fn login(
    Extension(storage): Extension<DynStorage>,
    Extension(sessions): Extension<Arc<SessionStore>>,
    Extension(settings): Extension<Settings>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    body.validate().map_err(ApiError::from_validation)?;

    // Username field accepts either username or email.
    let user = match storage.get_user_by_username(&body.username).await? {
        Some(user) => Some(user),
        None => storage.get_user_by_email(&body.username).await?,
    };

    // One rejection message for both bad username and bad password.
    let Some(user) = user else {
        return Err(ApiError::Unauthorized("Incorrect username or password".into()));
    };
    if !verify_login(&body.password, &user.password, settings.server.production) {
        return Err(ApiError::Unauthorized("Incorrect username or password".into()));
    }

    let cookie_value = sessions.create(&user.id);
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        sessions
            .cookie_header(&cookie_value)
            .parse()
            .map_err(|_| ApiError::Internal("invalid cookie header".into()))?,
    );

    tracing::info!(user_id = %user.id, "login successful");
    let body = Json(json!({
        "success": true,
        "message": "Authentication successful",
        "user": PublicUser::from(user),
    }));
    Ok((headers, body).into_response())
}

pub async fn logout(
    Extension(sessions): Extension<Arc<SessionStore>>,
    request_headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(cookie) = session_cookie(&request_headers) {
        sessions.destroy(&cookie);
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        sessions
            .clear_cookie_header()
            .parse()
            .map_err(|_| ApiError::Internal("invalid cookie header".into()))?,
    );

    let body = Json(json!({
        "success": true,
        "message": "Logged out successfully",
    }));
    Ok((headers, body).into_response())
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "user": PublicUser::from(user),
    }))
}
