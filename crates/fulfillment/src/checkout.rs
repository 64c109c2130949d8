//! The checkout transaction: cart in, pending order out.

use std::collections::HashMap;
use std::time::Duration;

use common::{ProductId, UserId};
use domain::{Order, OrderedItem, Product};
use store::{CheckoutPlan, FulfillmentStore, StockDecrement, StoreError};

use crate::{FulfillmentError, Result};

/// Default execution budget for one checkout.
pub const DEFAULT_CHECKOUT_BUDGET: Duration = Duration::from_secs(10);

/// Converts a user's cart into a pending order.
///
/// The service does a validation pass against a catalog read to produce
/// specific errors, then hands the store one [`CheckoutPlan`] to commit
/// atomically. The store's conditional decrements re-check stock against
/// committed state, so a stock change between the read and the commit can
/// fail the commit but never oversell.
pub struct CheckoutService<S> {
    store: S,
    budget: Duration,
}

impl<S: FulfillmentStore + Clone> CheckoutService<S> {
    /// Creates a checkout service with the default execution budget.
    pub fn new(store: S) -> Self {
        Self::with_budget(store, DEFAULT_CHECKOUT_BUDGET)
    }

    /// Creates a checkout service with an explicit execution budget.
    pub fn with_budget(store: S, budget: Duration) -> Self {
        Self { store, budget }
    }

    /// Places an order from the user's current cart.
    ///
    /// On success the cart is gone, stock is decremented and the returned
    /// order is `pending`. On any failure no partial effect is visible.
    #[tracing::instrument(skip(self, shipping_address), fields(user_id = %user_id))]
    pub async fn place_order(&self, user_id: UserId, shipping_address: &str) -> Result<Order> {
        let result = tokio::time::timeout(
            self.budget,
            self.place_order_inner(user_id, shipping_address),
        )
        .await
        .unwrap_or(Err(FulfillmentError::Timeout));

        match &result {
            Ok(order) => {
                metrics::counter!("checkouts_committed_total").increment(1);
                tracing::info!(order_id = %order.id, total = %order.total, "checkout committed");
            }
            Err(err) => {
                metrics::counter!("checkouts_rejected_total").increment(1);
                tracing::info!(error = %err, "checkout rejected");
            }
        }
        result
    }

    async fn place_order_inner(&self, user_id: UserId, shipping_address: &str) -> Result<Order> {
        if shipping_address.trim().is_empty() {
            return Err(FulfillmentError::ShippingAddressRequired);
        }

        let cart = self
            .store
            .cart_for_user(user_id)
            .await?
            .ok_or(FulfillmentError::EmptyCart)?;
        if cart.is_empty() {
            return Err(FulfillmentError::EmptyCart);
        }

        // One read for all referenced products.
        let product_ids: Vec<ProductId> = cart.items.iter().map(|i| i.product_id).collect();
        let products: HashMap<ProductId, Product> = self
            .store
            .products_by_ids(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut items = Vec::with_capacity(cart.items.len());
        for cart_item in &cart.items {
            let product = products
                .get(&cart_item.product_id)
                .ok_or(FulfillmentError::ProductMissing(cart_item.product_id))?;
            if !product.can_fulfill(cart_item.quantity) {
                return Err(FulfillmentError::InsufficientStock {
                    product_name: product.name.clone(),
                    available: product.stock,
                    requested: cart_item.quantity,
                });
            }
            items.push(OrderedItem::snapshot(product, cart_item.quantity));
        }

        let decrements = items
            .iter()
            .map(|i| StockDecrement {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect();
        let order = Order::place(user_id, items, shipping_address)?;
        let plan = CheckoutPlan {
            order,
            decrements,
            cart_id: cart.id,
        };

        // The commit may still lose a race another checkout won since our
        // read; translate the store's verdict with the names we know.
        match self.store.commit_checkout(plan).await {
            Ok(order) => Ok(order),
            Err(StoreError::InsufficientStock(product_id)) => {
                let (name, available) = match products.get(&product_id) {
                    Some(p) => (p.name.clone(), self.fresh_stock(product_id).await),
                    None => (product_id.to_string(), 0),
                };
                let requested = cart
                    .items
                    .iter()
                    .find(|i| i.product_id == product_id)
                    .map_or(0, |i| i.quantity);
                Err(FulfillmentError::InsufficientStock {
                    product_name: name,
                    available,
                    requested,
                })
            }
            Err(StoreError::ProductNotFound(product_id)) => {
                Err(FulfillmentError::ProductMissing(product_id))
            }
            Err(StoreError::CartNotFound(_)) => Err(FulfillmentError::EmptyCart),
            Err(err) => Err(err.into()),
        }
    }

    async fn fresh_stock(&self, product_id: ProductId) -> u32 {
        match self.store.product(product_id).await {
            Ok(Some(p)) => p.stock,
            _ => 0,
        }
    }
}
