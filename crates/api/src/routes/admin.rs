//! Administrative order endpoints, guarded by the admin key header.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use common::OrderId;
use domain::{DomainError, OrderStatus};
use fulfillment::FulfillmentError;
use serde::Deserialize;
use store::{FulfillmentStore, Transition};

use super::orders::{OrderResponse, order_response};
use super::{AppState, require_admin};
use crate::error::ApiError;

const DEFAULT_LIST_LIMIT: u32 = 100;

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    OrderStatus::from_str(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// GET /admin/orders?status= — orders across all users.
#[tracing::instrument(skip_all)]
pub async fn list<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    require_admin(&headers, &state)?;
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let orders = state.store.orders_with_status(status, limit).await?;
    Ok(Json(orders.iter().map(order_response).collect()))
}

/// PUT /admin/orders/{id}/status — move an order along the fulfillment
/// path (shipped, delivered, cancelled).
///
/// Payment-authority statuses are off limits here; only the webhook
/// processor may set them.
#[tracing::instrument(skip_all)]
pub async fn set_status<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    require_admin(&headers, &state)?;
    let order_id = OrderId::parse(&id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order id: {e}")))?;
    let next = parse_status(&req.status)?;

    if OrderStatus::is_payment_authority(next) {
        return Err(ApiError::Forbidden(format!(
            "status {next} is set by the payment processor"
        )));
    }

    let order = state
        .store
        .order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
    if !order.status.can_transition_to(next) {
        return Err(invalid_transition(order.status, next));
    }

    match state.store.transition_order(order_id, order.status, next).await? {
        Transition::Applied(updated) => Ok(Json(order_response(&updated))),
        // Lost a race with another writer; report against the fresh status.
        Transition::Superseded { current } => Err(invalid_transition(current, next)),
    }
}

fn invalid_transition(from: OrderStatus, to: OrderStatus) -> ApiError {
    ApiError::Fulfillment(FulfillmentError::Domain(DomainError::InvalidTransition {
        from,
        to,
    }))
}
