use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, OrderId, ProductId, UserId};
use domain::{Cart, Order, OrderStatus, Product, TokenRecord};
use tokio::sync::RwLock;

use crate::{
    CheckoutPlan, Result, StoreError,
    store::{FulfillmentStore, Transition},
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    carts: HashMap<CartId, Cart>,
    orders: HashMap<OrderId, Order>,
    tokens: HashMap<String, TokenRecord>,
    processed_events: HashSet<String>,
}

/// In-memory fulfillment store for tests and local runs.
///
/// A single `RwLock` over the whole state stands in for the database's
/// transaction isolation: [`commit_checkout`] validates and applies under
/// one write guard, so concurrent checkouts serialize exactly as they do
/// against Postgres.
///
/// [`commit_checkout`]: FulfillmentStore::commit_checkout
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock for a product. Test support.
    pub async fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.state.read().await.products.get(&id).map(|p| p.stock)
    }

    /// Returns the total number of orders stored. Test support.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all state.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = State::default();
    }
}

#[async_trait]
impl FulfillmentStore for InMemoryStore {
    async fn upsert_product(&self, product: &Product) -> Result<()> {
        self.state
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn cart(&self, id: CartId) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(&id).cloned())
    }

    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .values()
            .find(|c| c.owner == Some(user_id))
            .cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        self.state.write().await.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, id: CartId) -> Result<bool> {
        Ok(self.state.write().await.carts.remove(&id).is_some())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn orders_with_status(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit as usize);
        Ok(orders)
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Transition> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        if order.status != from {
            return Ok(Transition::Superseded {
                current: order.status,
            });
        }
        order.status = to;
        Ok(Transition::Applied(order.clone()))
    }

    async fn commit_checkout(&self, plan: CheckoutPlan) -> Result<Order> {
        plan.validate()?;
        let mut state = self.state.write().await;

        // Validate everything before mutating anything; the single write
        // guard makes validate-then-apply one atomic unit.
        if !state.carts.contains_key(&plan.cart_id) {
            return Err(StoreError::CartNotFound(plan.cart_id));
        }
        for decrement in &plan.decrements {
            let product = state
                .products
                .get(&decrement.product_id)
                .ok_or(StoreError::ProductNotFound(decrement.product_id))?;
            if product.stock < decrement.quantity {
                return Err(StoreError::InsufficientStock(decrement.product_id));
            }
        }

        for decrement in &plan.decrements {
            let product = state
                .products
                .get_mut(&decrement.product_id)
                .expect("validated above");
            product.stock -= decrement.quantity;
        }
        state.carts.remove(&plan.cart_id);
        state.orders.insert(plan.order.id, plan.order.clone());

        Ok(plan.order)
    }

    async fn put_token(&self, record: &TokenRecord) -> Result<()> {
        let mut state = self.state.write().await;
        state.tokens.retain(|_, r| r.email != record.email);
        state.tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn take_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        let mut state = self.state.write().await;
        match state.tokens.remove(token) {
            Some(record) if !record.is_expired(Utc::now()) => Ok(Some(record)),
            _ => Ok(None),
        }
    }

    async fn token_for_email(&self, email: &str) -> Result<Option<String>> {
        let state = self.state.read().await;
        let now = Utc::now();
        Ok(state
            .tokens
            .values()
            .find(|r| r.email == email && !r.is_expired(now))
            .map(|r| r.token.clone()))
    }

    async fn record_payment_event(&self, event_id: &str) -> Result<bool> {
        Ok(self
            .state
            .write()
            .await
            .processed_events
            .insert(event_id.to_string()))
    }
}
