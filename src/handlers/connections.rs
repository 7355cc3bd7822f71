use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::storage::{DynStorage, Role};
use crate::utils::error::ApiError;

/// Lists the caller's connections: purchases for clients, incoming
/// client connections for advocates.
pub async fn list(
    Extension(storage): Extension<DynStorage>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let connections = match user.role {
        Role::Advocate => match storage.get_advocate_by_user(&user.id).await? {
            Some(advocate) => storage.connections_by_advocate(&advocate.id).await?,
            None => Vec::new(),
        },
        _ => storage.connections_by_client(&user.id).await?,
    };

    Ok(Json(json!({
        "success": true,
        "data": connections,
    })))
}
