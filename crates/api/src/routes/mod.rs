//! HTTP route handlers and shared application state.

pub mod admin;
pub mod carts;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;

use axum::http::HeaderMap;
use common::{CartId, UserId};
use fulfillment::{CartMergeReconciler, CheckoutService};
use ::payments::{InMemoryGateway, InMemoryNotifier, PaymentEventProcessor};
use store::FulfillmentStore;

use crate::error::ApiError;

/// Header carrying the authenticated user id, set by the auth layer in
/// front of this service.
pub const USER_HEADER: &str = "x-user-id";
/// Header carrying a guest cart id.
pub const CART_HEADER: &str = "x-cart-id";
/// Header guarding the `/admin` routes.
pub const ADMIN_HEADER: &str = "x-admin-key";
/// Header carrying the provider's webhook signature.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Shared application state accessible from all handlers.
pub struct AppState<S: FulfillmentStore> {
    pub store: S,
    pub checkout: CheckoutService<S>,
    pub merger: CartMergeReconciler<S>,
    pub processor: PaymentEventProcessor<S, InMemoryNotifier>,
    pub gateway: InMemoryGateway,
    pub admin_key: String,
}

/// Extracts the authenticated user id, or 401.
pub(crate) fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let raw = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("{USER_HEADER} header required")))?;
    UserId::parse(raw).map_err(|e| ApiError::Unauthorized(format!("invalid {USER_HEADER}: {e}")))
}

/// Extracts the authenticated user id if the header is present.
pub(crate) fn optional_user(headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
    if headers.contains_key(USER_HEADER) {
        require_user(headers).map(Some)
    } else {
        Ok(None)
    }
}

/// Extracts the guest cart id if the header is present.
pub(crate) fn guest_cart_id(headers: &HeaderMap) -> Result<Option<CartId>, ApiError> {
    let Some(raw) = headers.get(CART_HEADER).and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };
    CartId::parse(raw)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("invalid {CART_HEADER}: {e}")))
}

/// Checks the admin key header against the configured key, or 403.
pub(crate) fn require_admin<S: FulfillmentStore>(
    headers: &HeaderMap,
    state: &AppState<S>,
) -> Result<(), ApiError> {
    let supplied = headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok());
    if supplied == Some(state.admin_key.as_str()) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin key required".to_string()))
    }
}
