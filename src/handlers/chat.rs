use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::MaybeUser;
use crate::chatbot;
use crate::storage::{DynStorage, NewChatMessage};
use crate::utils::error::ApiError;

/// User id recorded for unauthenticated chat participants.
const GUEST_USER_ID: &str = "guest";

const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

pub async fn post_message(
    Extension(storage): Extension<DynStorage>,
    MaybeUser(user): MaybeUser,
    Json(body): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Message is required and must be a string".into(),
        ));
    }

    let user_id = user
        .map(|u| u.id)
        .unwrap_or_else(|| GUEST_USER_ID.to_string());

    storage
        .create_chat_message(NewChatMessage {
            user_id: user_id.clone(),
            is_user_message: true,
            content: body.message.clone(),
        })
        .await?;

    let response = chatbot::reply(&body.message);

    storage
        .create_chat_message(NewChatMessage {
            user_id,
            is_user_message: false,
            content: response.clone(),
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "response": response,
    })))
}

pub async fn history(
    Extension(storage): Extension<DynStorage>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let messages = storage.chat_history(&user_id, limit).await?;

    Ok(Json(json!({
        "success": true,
        "data": messages,
    })))
}

pub async fn suggested_questions() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": chatbot::suggested_questions(),
    }))
}
