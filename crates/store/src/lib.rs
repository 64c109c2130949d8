//! Persistence layer for the order fulfillment pipeline.
//!
//! The [`FulfillmentStore`] trait is the transactional boundary of the
//! system: the atomic checkout commit, the conditional stock decrement,
//! the status compare-and-set, the single-use token take and the payment
//! event idempotency keys all live behind it. Two implementations are
//! provided:
//!
//! - [`InMemoryStore`] for tests and local runs
//! - [`PostgresStore`] backed by sqlx, with SQL migrations under
//!   `migrations/` at the workspace root

pub mod checkout;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use checkout::{CheckoutPlan, StockDecrement};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{FulfillmentStore, Transition};
