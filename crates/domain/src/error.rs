//! Domain error types.

use thiserror::Error;

use crate::OrderStatus;

/// Errors raised by the domain model itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// The state machine forbids this status change.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A quantity outside the permitted range (must be >= 1).
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// An order must carry at least one item.
    #[error("order has no items")]
    EmptyOrder,

    /// A status string that is not part of the state machine.
    #[error("unknown order status: {0}")]
    UnknownStatus(String),
}
