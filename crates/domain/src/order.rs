//! Orders and their immutable line-item snapshots.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Money, OrderStatus, Product};

/// An order line captured at checkout time.
///
/// Name and unit price are snapshots: later catalog edits never alter
/// historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderedItem {
    /// Snapshots a cart line against the product record it referenced.
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    /// Returns this line's subtotal.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A confirmed order. Created exactly once per successful checkout and
/// never deleted; only `status` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderedItem>,
    /// Always equal to the sum of the item subtotals; derived at
    /// construction, never editable independently.
    pub total: Money,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new pending order from snapshot items.
    ///
    /// The total is computed here, server-side, from the snapshots alone.
    pub fn place(
        user_id: UserId,
        items: Vec<OrderedItem>,
        shipping_address: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        let total = items.iter().map(OrderedItem::subtotal).sum();
        Ok(Self {
            id: OrderId::new(),
            user_id,
            items,
            total,
            shipping_address: shipping_address.into(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        })
    }

    /// Recomputes the total from the snapshot items. Used by storage
    /// round-trip checks to assert the derived-total invariant.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(OrderedItem::subtotal).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, cents: i64, stock: u32) -> Product {
        Product::new(ProductId::new(), name, Money::from_cents(cents), stock)
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let items = vec![
            OrderedItem::snapshot(&product("A", 1000, 10), 2),
            OrderedItem::snapshot(&product("B", 500, 10), 1),
        ];
        let order = Order::place(UserId::new(), items, "1 Main St").unwrap();

        assert_eq!(order.total.cents(), 2500);
        assert_eq!(order.total, order.computed_total());
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_snapshot_is_immune_to_catalog_edits() {
        let mut catalog_product = product("Phone", 9999, 5);
        let item = OrderedItem::snapshot(&catalog_product, 1);
        let order = Order::place(UserId::new(), vec![item], "1 Main St").unwrap();

        catalog_product.price = Money::from_cents(1);
        catalog_product.name = "Renamed".to_string();

        assert_eq!(order.items[0].unit_price.cents(), 9999);
        assert_eq!(order.items[0].name, "Phone");
        assert_eq!(order.total.cents(), 9999);
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = Order::place(UserId::new(), vec![], "1 Main St").unwrap_err();
        assert!(matches!(err, DomainError::EmptyOrder));
    }

    #[test]
    fn test_subtotal_multiplies() {
        let item = OrderedItem::snapshot(&product("C", 250, 10), 4);
        assert_eq!(item.subtotal().cents(), 1000);
    }
}
