//! Fulfillment workflow error types.

use common::ProductId;
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the checkout, merge and token workflows.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Checkout attempted with no cart or an item-less cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Checkout attempted without a shipping address.
    #[error("shipping address is required")]
    ShippingAddressRequired,

    /// A product referenced by the cart no longer exists in the catalog.
    #[error("a product in the cart could not be found: {0}")]
    ProductMissing(ProductId),

    /// Requested quantity exceeds available stock.
    #[error("insufficient stock for '{product_name}': {available} available, {requested} requested")]
    InsufficientStock {
        product_name: String,
        available: u32,
        requested: u32,
    },

    /// A verification or reset token that is unknown, already consumed, or
    /// past its expiry. All three cases are indistinguishable on purpose.
    #[error("token is invalid or expired")]
    InvalidOrExpiredToken,

    /// The checkout exceeded its execution budget. Nothing was committed.
    #[error("checkout timed out")]
    Timeout,

    /// Domain invariant violation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for fulfillment operations.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
