//! Payment intent creation and the provider webhook.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use common::OrderId;
use domain::OrderStatus;
use payments::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::FulfillmentStore;

use super::{AppState, SIGNATURE_HEADER, require_user};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateIntentRequest {
    pub order_id: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Serialize)]
pub struct IntentResponse {
    pub client_secret: String,
    pub amount_cents: i64,
}

/// POST /payments/intent — create a payment intent for a pending order.
///
/// The charge amount comes from the stored order total, never from the
/// request body.
#[tracing::instrument(skip_all)]
pub async fn create_intent<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
    let user_id = require_user(&headers)?;
    let order_id = OrderId::parse(&req.order_id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order_id: {e}")))?;

    let order = state
        .store
        .order(order_id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))?;
    if order.status != OrderStatus::Pending {
        return Err(ApiError::BadRequest(format!(
            "order is {}, not awaiting payment",
            order.status
        )));
    }

    let intent = state
        .gateway
        .create_intent(order.id, order.total, &req.currency)
        .await?;
    Ok(Json(IntentResponse {
        client_secret: intent.client_secret,
        amount_cents: intent.amount.cents(),
    }))
}

/// POST /webhooks/payment — signed provider event delivery.
///
/// Takes the raw body; signature verification needs the exact bytes as
/// sent. Every processed outcome is acknowledged with `{"received": true}`.
#[tracing::instrument(skip_all)]
pub async fn webhook<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::BadRequest(format!("{SIGNATURE_HEADER} header required"))
        })?;

    let receipt = state.processor.process(&body, signature).await?;
    tracing::debug!(?receipt, "webhook acknowledged");
    Ok(Json(serde_json::json!({ "received": true })))
}
