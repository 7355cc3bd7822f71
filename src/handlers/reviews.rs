use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::storage::{DynStorage, NewReview};
use crate::utils::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    pub content: Option<String>,
}

pub async fn create(
    Extension(storage): Extension<DynStorage>,
    CurrentUser(user): CurrentUser,
    Path(advocate_id): Path<String>,
    Json(body): Json<ReviewRequest>,
) -> Result<Response, ApiError> {
    body.validate().map_err(ApiError::from_validation)?;

    if storage.get_advocate(&advocate_id).await?.is_none() {
        return Err(ApiError::NotFound("Advocate not found".into()));
    }

    let review = storage
        .create_review(NewReview {
            advocate_id,
            user_id: user.id,
            rating: body.rating,
            content: body.content,
        })
        .await?;

    let body = Json(json!({
        "success": true,
        "message": "Review submitted successfully",
        "data": review,
    }));
    Ok((StatusCode::CREATED, body).into_response())
}

pub async fn list(
    Extension(storage): Extension<DynStorage>,
    Path(advocate_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if storage.get_advocate(&advocate_id).await?.is_none() {
        return Err(ApiError::NotFound("Advocate not found".into()));
    }

    let reviews = storage.reviews_for_advocate(&advocate_id).await?;
    Ok(Json(json!({
        "success": true,
        "data": reviews,
    })))
}
