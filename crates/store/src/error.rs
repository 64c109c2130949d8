use common::{CartId, OrderId, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the fulfillment store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional stock decrement matched no row because the remaining
    /// stock was below the requested quantity. The surrounding checkout
    /// transaction has been rolled back.
    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    /// A product referenced by the checkout no longer exists.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The cart to consume at checkout was already gone. Two checkouts
    /// racing on the same cart surface this on the loser.
    #[error("cart not found: {0}")]
    CartNotFound(CartId),

    /// The order targeted by a status transition does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// A checkout plan that fails its structural checks.
    #[error("invalid checkout plan: {0}")]
    InvalidPlan(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
