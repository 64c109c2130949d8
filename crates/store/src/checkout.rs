//! The checkout commit unit handed to the store.

use common::{CartId, ProductId};
use domain::Order;

use crate::{Result, StoreError};

/// One conditional stock decrement within a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Everything a checkout must commit as one atomic unit: the stock
/// decrements, the new order, and the deletion of the consumed cart.
///
/// The plan is built by the checkout service after its validation pass;
/// the store re-checks every decrement conditionally (`stock >= quantity`)
/// at commit time, so a plan built against a stale read can never oversell.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    pub order: Order,
    pub decrements: Vec<StockDecrement>,
    pub cart_id: CartId,
}

impl CheckoutPlan {
    /// Structural checks a plan must pass before commit.
    pub fn validate(&self) -> Result<()> {
        if self.order.items.is_empty() {
            return Err(StoreError::InvalidPlan("order has no items".to_string()));
        }
        if self.decrements.len() != self.order.items.len() {
            return Err(StoreError::InvalidPlan(
                "decrements do not match order items".to_string(),
            ));
        }
        for (decrement, item) in self.decrements.iter().zip(&self.order.items) {
            if decrement.product_id != item.product_id || decrement.quantity != item.quantity {
                return Err(StoreError::InvalidPlan(
                    "decrements do not match order items".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;
    use domain::{Money, Order, OrderedItem, Product};

    fn plan_for(quantities: &[u32]) -> CheckoutPlan {
        let items: Vec<OrderedItem> = quantities
            .iter()
            .map(|&q| {
                let product =
                    Product::new(ProductId::new(), "Widget", Money::from_cents(100), 100);
                OrderedItem::snapshot(&product, q)
            })
            .collect();
        let decrements = items
            .iter()
            .map(|i| StockDecrement {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect();
        let order = Order::place(UserId::new(), items, "1 Main St").unwrap();
        CheckoutPlan {
            order,
            decrements,
            cart_id: CartId::new(),
        }
    }

    #[test]
    fn test_valid_plan_passes() {
        assert!(plan_for(&[1, 2]).validate().is_ok());
    }

    #[test]
    fn test_mismatched_decrements_rejected() {
        let mut plan = plan_for(&[1, 2]);
        plan.decrements.pop();
        assert!(matches!(
            plan.validate(),
            Err(StoreError::InvalidPlan(_))
        ));

        let mut plan = plan_for(&[1]);
        plan.decrements[0].quantity = 9;
        assert!(plan.validate().is_err());
    }
}
