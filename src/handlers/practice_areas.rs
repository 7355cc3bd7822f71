use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::storage::DynStorage;
use crate::utils::error::ApiError;

pub async fn list(Extension(storage): Extension<DynStorage>) -> Result<Json<Value>, ApiError> {
    let areas = storage.all_practice_areas().await?;
    Ok(Json(json!({
        "success": true,
        "data": areas,
    })))
}
