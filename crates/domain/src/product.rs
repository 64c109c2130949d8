//! Catalog products, as seen by the fulfillment core.
//!
//! Catalog CRUD belongs to an external collaborator; this crate only reads
//! product records and decrements their stock conditionally at checkout.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::Money;

/// A product record with its authoritative stock count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    /// Units currently available. Unsigned: stock can never be negative,
    /// and the store layer only ever decrements it conditionally.
    pub stock: u32,
}

impl Product {
    /// Creates a product record.
    pub fn new(id: ProductId, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            stock,
        }
    }

    /// Returns true if `quantity` units could be fulfilled from current stock.
    pub fn can_fulfill(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_fulfill_boundary() {
        let product = Product::new(ProductId::new(), "Widget", Money::from_cents(1000), 3);
        assert!(product.can_fulfill(3));
        assert!(!product.can_fulfill(4));
        assert!(product.can_fulfill(0));
    }
}
