//! Workflow services for the order fulfillment pipeline.
//!
//! - [`CheckoutService`] converts a cart into a pending order through one
//!   atomic store commit with a bounded execution budget
//! - [`CartMergeReconciler`] folds a guest cart into a user cart at login
//! - [`TokenService`] issues and redeems single-use ephemeral tokens
//!
//! All three are generic over [`store::FulfillmentStore`], so they run
//! unchanged against the in-memory store in tests and Postgres in
//! production.

pub mod checkout;
pub mod error;
pub mod merge;
pub mod tokens;

pub use checkout::{CheckoutService, DEFAULT_CHECKOUT_BUDGET};
pub use error::{FulfillmentError, Result};
pub use merge::{CartMergeReconciler, MergeOutcome};
pub use tokens::{DEFAULT_TOKEN_TTL, TokenService};
