//! Domain model for the order fulfillment pipeline.
//!
//! This crate holds the pure data model and its invariants:
//! - [`Money`] in integer minor units
//! - [`Product`] records with non-negative stock
//! - [`Cart`] / [`CartItem`] with at-most-one-line-per-product
//! - [`Order`] / [`OrderedItem`] checkout-time snapshots with derived totals
//! - the [`OrderStatus`] state machine
//! - [`TokenRecord`] single-use ephemeral tokens
//!
//! Nothing here touches storage or the network; persistence and
//! orchestration live in the `store` and `fulfillment` crates.

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod product;
pub mod status;
pub mod token;

pub use cart::{Cart, CartItem};
pub use error::DomainError;
pub use money::Money;
pub use order::{Order, OrderedItem};
pub use product::Product;
pub use status::OrderStatus;
pub use token::TokenRecord;
