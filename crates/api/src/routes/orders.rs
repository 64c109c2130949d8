//! Checkout and order read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::OrderId;
use domain::Order;
use serde::{Deserialize, Serialize};
use store::FulfillmentStore;

use super::{AppState, require_user};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub shipping_address: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub shipping_address: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

pub(crate) fn order_response(order: &Order) -> OrderResponse {
    OrderResponse {
        id: order.id.to_string(),
        status: order.status.to_string(),
        items: order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
            })
            .collect(),
        total_cents: order.total.cents(),
        shipping_address: order.shipping_address.clone(),
        created_at: order.created_at.to_rfc3339(),
    }
}

/// POST /orders — place an order from the user's cart.
#[tracing::instrument(skip_all)]
pub async fn place<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id = require_user(&headers)?;
    let order = state
        .checkout
        .place_order(user_id, &req.shipping_address)
        .await?;
    Ok((StatusCode::CREATED, Json(order_response(&order))))
}

/// GET /orders — the user's order history, newest first.
#[tracing::instrument(skip_all)]
pub async fn list<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user_id = require_user(&headers)?;
    let orders = state.store.orders_for_user(user_id).await?;
    Ok(Json(orders.iter().map(order_response).collect()))
}

/// GET /orders/{id} — a single order, only visible to its owner.
#[tracing::instrument(skip_all)]
pub async fn get<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let user_id = require_user(&headers)?;
    let order_id = OrderId::parse(&id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order id: {e}")))?;

    let order = state
        .store
        .order(order_id)
        .await?
        // A foreign order reads the same as a missing one.
        .filter(|o| o.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order_response(&order)))
}
