use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::config::Settings;
use crate::payments::RazorpayClient;
use crate::storage::{ConnectionStatus, DynStorage, NewConnection};
use crate::utils::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub advocate_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub connection_id: String,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Creates a gateway order for the connection fee. The connection is
/// recorded as pending immediately so the verify step only has to flip
/// its status.
pub async fn create_order(
    Extension(storage): Extension<DynStorage>,
    Extension(gateway): Extension<Arc<RazorpayClient>>,
    Extension(settings): Extension<Settings>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<OrderRequest>,
) -> Result<Response, ApiError> {
    if storage.get_advocate(&body.advocate_id).await?.is_none() {
        return Err(ApiError::NotFound("Advocate not found".into()));
    }

    let connection = storage
        .create_connection(NewConnection {
            advocate_id: body.advocate_id,
            client_id: user.id,
            status: ConnectionStatus::Pending,
            payment_id: None,
            expires_at: None,
        })
        .await?;

    let order = gateway
        .create_order(
            settings.payment.connection_fee,
            &settings.payment.currency,
            &connection.id,
        )
        .await?;

    tracing::info!(connection_id = %connection.id, order_id = %order.id, "payment order created");
    let body = Json(json!({
        "success": true,
        "data": {
            "orderId": order.id,
            "amount": order.amount,
            "currency": order.currency,
            "keyId": gateway.key_id(),
            "connectionId": connection.id,
        }
    }));
    Ok((StatusCode::CREATED, body).into_response())
}

/// Confirms the checkout callback. A valid signature activates the
/// pending connection; an invalid one leaves it untouched.
pub async fn verify(
    Extension(storage): Extension<DynStorage>,
    Extension(gateway): Extension<Arc<RazorpayClient>>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let connection = storage
        .get_connection(&body.connection_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Connection not found".into()))?;
    if connection.client_id != user.id {
        return Err(ApiError::Forbidden("Connection belongs to another user".into()));
    }

    if !gateway.verify_payment_signature(&body.order_id, &body.payment_id, &body.signature) {
        tracing::warn!(connection_id = %connection.id, "payment signature mismatch");
        return Err(ApiError::BadRequest("Invalid payment signature".into()));
    }

    let updated = storage
        .update_connection_status(
            &connection.id,
            ConnectionStatus::Active,
            Some(body.payment_id),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Connection not found".into()))?;

    tracing::info!(connection_id = %updated.id, "payment verified, connection active");
    Ok(Json(json!({
        "success": true,
        "message": "Payment verified successfully",
        "data": updated,
    })))
}
