use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

pub async fn status() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "API is working",
        "data": {
            "timestamp": Utc::now().to_rfc3339(),
        }
    }))
}
