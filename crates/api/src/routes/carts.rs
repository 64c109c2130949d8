//! Cart endpoints: read, item mutation, and the login-time merge.
//!
//! A request carries identity in `x-user-id` (logged-in) or `x-cart-id`
//! (guest). Adding an item with neither creates a fresh guest cart; the
//! cart id is echoed back in the `x-cart-id` response header so the client
//! can hold on to it.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use common::ProductId;
use domain::Cart;
use fulfillment::MergeOutcome;
use serde::{Deserialize, Serialize};
use store::FulfillmentStore;

use super::{AppState, CART_HEADER, guest_cart_id, optional_user, require_user};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub items: Vec<CartItemResponse>,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct MergeResponse {
    pub outcome: &'static str,
    pub cart: Option<CartResponse>,
}

fn cart_response(cart: &Cart) -> CartResponse {
    CartResponse {
        id: cart.id.to_string(),
        items: cart
            .items
            .iter()
            .map(|i| CartItemResponse {
                product_id: i.product_id.to_string(),
                quantity: i.quantity,
            })
            .collect(),
    }
}

/// Wraps a cart body with the `x-cart-id` echo header.
fn with_cart_header(status: StatusCode, cart: &Cart) -> Response {
    (
        status,
        [(CART_HEADER, cart.id.to_string())],
        Json(cart_response(cart)),
    )
        .into_response()
}

/// Resolves the cart the request identity refers to, if it exists.
async fn resolve_cart<S: FulfillmentStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<Option<Cart>, ApiError> {
    if let Some(user_id) = optional_user(headers)? {
        return Ok(state.store.cart_for_user(user_id).await?);
    }
    if let Some(cart_id) = guest_cart_id(headers)? {
        let cart = state.store.cart(cart_id).await?;
        // An owned cart is not addressable by bare cart id.
        return Ok(cart.filter(|c| c.owner.is_none()));
    }
    Err(ApiError::Unauthorized(
        "x-user-id or x-cart-id header required".to_string(),
    ))
}

/// GET /cart — the current user or guest cart.
#[tracing::instrument(skip_all)]
pub async fn get<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let cart = resolve_cart(&state, &headers)
        .await?
        .ok_or_else(|| ApiError::NotFound("no cart".to_string()))?;
    Ok(with_cart_header(StatusCode::OK, &cart))
}

/// POST /cart/items — add quantity of a product, creating the cart if
/// needed.
#[tracing::instrument(skip_all)]
pub async fn add_item<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<AddItemRequest>,
) -> Result<Response, ApiError> {
    let product_id = ProductId::parse(&req.product_id)
        .map_err(|e| ApiError::BadRequest(format!("invalid product_id: {e}")))?;
    state
        .store
        .product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {product_id} not found")))?;

    let user = optional_user(&headers)?;
    let existing = match user {
        Some(user_id) => state.store.cart_for_user(user_id).await?,
        None => match guest_cart_id(&headers)? {
            Some(cart_id) => state
                .store
                .cart(cart_id)
                .await?
                .filter(|c| c.owner.is_none()),
            None => None,
        },
    };

    let (mut cart, created) = match existing {
        Some(cart) => (cart, false),
        None => match user {
            Some(user_id) => (Cart::for_user(user_id), true),
            None => (Cart::guest(), true),
        },
    };

    cart.add_item(product_id, req.quantity)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state.store.save_cart(&cart).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(with_cart_header(status, &cart))
}

/// PUT /cart/items/{product_id} — set an item's quantity.
#[tracing::instrument(skip_all)]
pub async fn set_quantity<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Response, ApiError> {
    let product_id = ProductId::parse(&product_id)
        .map_err(|e| ApiError::BadRequest(format!("invalid product_id: {e}")))?;
    let mut cart = resolve_cart(&state, &headers)
        .await?
        .ok_or_else(|| ApiError::NotFound("no cart".to_string()))?;

    let updated = cart
        .set_quantity(product_id, req.quantity)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if !updated {
        return Err(ApiError::NotFound(format!(
            "product {product_id} not in cart"
        )));
    }
    state.store.save_cart(&cart).await?;
    Ok(with_cart_header(StatusCode::OK, &cart))
}

/// DELETE /cart/items/{product_id} — remove an item.
#[tracing::instrument(skip_all)]
pub async fn remove_item<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<Response, ApiError> {
    let product_id = ProductId::parse(&product_id)
        .map_err(|e| ApiError::BadRequest(format!("invalid product_id: {e}")))?;
    let mut cart = resolve_cart(&state, &headers)
        .await?
        .ok_or_else(|| ApiError::NotFound("no cart".to_string()))?;

    if !cart.remove_item(product_id) {
        return Err(ApiError::NotFound(format!(
            "product {product_id} not in cart"
        )));
    }
    state.store.save_cart(&cart).await?;
    Ok(with_cart_header(StatusCode::OK, &cart))
}

/// POST /cart/merge — fold the guest cart named by `x-cart-id` into the
/// authenticated user's cart. Invoked by the auth layer right after login.
#[tracing::instrument(skip_all)]
pub async fn merge<S: FulfillmentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<MergeResponse>, ApiError> {
    let user_id = require_user(&headers)?;
    let guest_id = guest_cart_id(&headers)?.ok_or_else(|| {
        ApiError::BadRequest("x-cart-id header required for merge".to_string())
    })?;

    let outcome = state.merger.merge_into_user(user_id, guest_id).await?;
    let cart = state.store.cart_for_user(user_id).await?;

    let outcome = match outcome {
        MergeOutcome::Nothing => "nothing",
        MergeOutcome::Claimed => "claimed",
        MergeOutcome::Merged => "merged",
    };
    Ok(Json(MergeResponse {
        outcome,
        cart: cart.as_ref().map(cart_response),
    }))
}
