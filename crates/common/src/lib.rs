//! Shared identifier types used across the order fulfillment workspace.

pub mod types;

pub use types::{CartId, OrderId, ProductId, UserId};
