use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::storage::{AdvocateFilter, DynStorage};
use crate::utils::error::ApiError;

pub async fn list(
    Extension(storage): Extension<DynStorage>,
    Query(filter): Query<AdvocateFilter>,
) -> Result<Json<Value>, ApiError> {
    let advocates = if filter.is_empty() {
        storage.all_advocate_details().await?
    } else {
        storage.advocates_by_filter(&filter).await?
    };

    Ok(Json(json!({
        "success": true,
        "data": advocates,
    })))
}

pub async fn get(
    Extension(storage): Extension<DynStorage>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let advocate = storage
        .advocate_details(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Advocate not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "data": advocate,
    })))
}
