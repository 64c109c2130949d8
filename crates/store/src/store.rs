use async_trait::async_trait;
use common::{CartId, OrderId, ProductId, UserId};
use domain::{Cart, Order, OrderStatus, Product, TokenRecord};

use crate::{CheckoutPlan, Result};

/// Outcome of a compare-and-set status transition.
#[derive(Debug, Clone)]
pub enum Transition {
    /// The order matched the expected status and was moved.
    Applied(Order),
    /// The order exists but was no longer in the expected status; nothing
    /// was written. Re-deliveries of an already-applied payment event land
    /// here.
    Superseded { current: OrderStatus },
}

impl Transition {
    /// Returns true if the transition was written.
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }
}

/// Persistence contract for the order fulfillment pipeline.
///
/// Every method is an atomic unit on its own; [`commit_checkout`] is the
/// one multi-entity unit and is all-or-nothing. Implementations must be
/// safe to share across concurrent request tasks (`Send + Sync`), and
/// cross-entity consistency is theirs to provide - callers never hold
/// in-process locks around store calls.
///
/// [`commit_checkout`]: FulfillmentStore::commit_checkout
#[async_trait]
pub trait FulfillmentStore: Send + Sync {
    // --- Catalog (read side + seeding; catalog CRUD is external) ---

    /// Inserts or replaces a product record.
    async fn upsert_product(&self, product: &Product) -> Result<()>;

    /// Fetches a single product.
    async fn product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Fetches all listed products in one read. Missing ids are simply
    /// absent from the result; the caller decides whether that is an error.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    // --- Carts ---

    /// Fetches a cart by id (guest carts are only reachable this way).
    async fn cart(&self, id: CartId) -> Result<Option<Cart>>;

    /// Fetches the single cart owned by a user, if any.
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or updates a cart.
    async fn save_cart(&self, cart: &Cart) -> Result<()>;

    /// Deletes a cart. Returns false if it did not exist.
    async fn delete_cart(&self, id: CartId) -> Result<bool>;

    // --- Orders ---

    /// Fetches an order by id.
    async fn order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Fetches a user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Fetches orders across all users, newest first, optionally filtered
    /// by status. Administrative listing.
    async fn orders_with_status(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> Result<Vec<Order>>;

    /// Atomically moves an order from `from` to `to` as one compare-and-set.
    ///
    /// Two near-simultaneous callers both expecting `from` cannot both win:
    /// exactly one observes [`Transition::Applied`], the other
    /// [`Transition::Superseded`]. Errors with `OrderNotFound` if the order
    /// does not exist.
    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Transition>;

    // --- Checkout ---

    /// Commits a checkout as one atomic unit: every stock decrement is
    /// applied conditionally (`stock >= quantity`), the order is inserted
    /// with status `pending`, and the consumed cart is deleted. On any
    /// failure nothing persists.
    ///
    /// The conditional decrement is the authoritative oversell guard; it is
    /// evaluated against committed state, not the caller's earlier read.
    async fn commit_checkout(&self, plan: CheckoutPlan) -> Result<Order>;

    // --- Ephemeral tokens ---

    /// Stores a token record under its token string. Any earlier record for
    /// the same email is removed, so a reissue leaves exactly one redeemable
    /// token per address.
    async fn put_token(&self, record: &TokenRecord) -> Result<()>;

    /// Atomically removes and returns a token record. Expired or unknown
    /// tokens yield `None`; of two concurrent takes of the same token,
    /// exactly one receives the record.
    async fn take_token(&self, token: &str) -> Result<Option<TokenRecord>>;

    /// Looks up the live token issued to an email address, for the resend
    /// flow.
    async fn token_for_email(&self, email: &str) -> Result<Option<String>>;

    // --- Payment event idempotency keys ---

    /// Records a provider event id, returning true only for the first
    /// caller. At-least-once delivery makes re-invocations with the same id
    /// routine; they get false and must not re-apply the event.
    async fn record_payment_event(&self, event_id: &str) -> Result<bool>;
}
