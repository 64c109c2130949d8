//! Guest-cart-to-user-cart reconciliation at login.

use common::{CartId, UserId};
use store::FulfillmentStore;

use crate::Result;

/// What the reconciler did. Useful for logging and for callers that echo
/// the surviving cart back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No live guest cart under that id; nothing to do. Re-invocations
    /// after a completed merge land here.
    Nothing,
    /// The user had no cart, so the guest cart was reassigned wholesale.
    Claimed,
    /// Guest items were folded into the user's existing cart and the guest
    /// cart deleted.
    Merged,
}

/// Folds an anonymous cart into a user's cart when the user authenticates.
///
/// Invoked once, synchronously, at login when the client presents a guest
/// cart id alongside credentials. Safe against re-invocation with an
/// already-consumed guest cart id: the second call finds no guest cart and
/// no-ops, so a login retry can never double-count quantities.
pub struct CartMergeReconciler<S> {
    store: S,
}

impl<S: FulfillmentStore> CartMergeReconciler<S> {
    /// Creates a reconciler over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Merges the guest cart into the user's cart per the rules above.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, guest_cart_id = %guest_cart_id))]
    pub async fn merge_into_user(
        &self,
        user_id: UserId,
        guest_cart_id: CartId,
    ) -> Result<MergeOutcome> {
        let Some(guest_cart) = self.store.cart(guest_cart_id).await? else {
            return Ok(MergeOutcome::Nothing);
        };
        if guest_cart.owner.is_some() {
            // Not a guest cart (or already claimed by someone); leave it be.
            tracing::warn!("merge requested for an owned cart; ignoring");
            return Ok(MergeOutcome::Nothing);
        }

        let outcome = match self.store.cart_for_user(user_id).await? {
            Some(mut user_cart) => {
                user_cart.absorb(guest_cart);
                self.store.save_cart(&user_cart).await?;
                self.store.delete_cart(guest_cart_id).await?;
                MergeOutcome::Merged
            }
            None => {
                // O(1): rename the owner, no item-level work.
                let mut claimed = guest_cart;
                claimed.claim(user_id);
                self.store.save_cart(&claimed).await?;
                MergeOutcome::Claimed
            }
        };

        metrics::counter!("carts_merged_total").increment(1);
        tracing::info!(?outcome, "guest cart reconciled");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use domain::Cart;
    use store::InMemoryStore;

    fn quantity_of(cart: &Cart, product: ProductId) -> u32 {
        cart.items
            .iter()
            .find(|i| i.product_id == product)
            .map_or(0, |i| i.quantity)
    }

    #[tokio::test]
    async fn test_merge_sums_quantities_and_appends() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let product_a = ProductId::new();
        let product_b = ProductId::new();

        let mut user_cart = Cart::for_user(user);
        user_cart.add_item(product_a, 3).unwrap();
        user_cart.add_item(product_b, 1).unwrap();
        store.save_cart(&user_cart).await.unwrap();

        let mut guest_cart = Cart::guest();
        guest_cart.add_item(product_a, 2).unwrap();
        store.save_cart(&guest_cart).await.unwrap();

        let reconciler = CartMergeReconciler::new(store.clone());
        let outcome = reconciler
            .merge_into_user(user, guest_cart.id)
            .await
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);

        let merged = store.cart_for_user(user).await.unwrap().unwrap();
        assert_eq!(quantity_of(&merged, product_a), 5);
        assert_eq!(quantity_of(&merged, product_b), 1);
        assert!(store.cart(guest_cart.id).await.unwrap().is_none());

        // Running the merge again with the consumed guest cart id must be
        // a no-op with identical results.
        let again = reconciler
            .merge_into_user(user, guest_cart.id)
            .await
            .unwrap();
        assert_eq!(again, MergeOutcome::Nothing);
        let unchanged = store.cart_for_user(user).await.unwrap().unwrap();
        assert_eq!(quantity_of(&unchanged, product_a), 5);
        assert_eq!(quantity_of(&unchanged, product_b), 1);
    }

    #[tokio::test]
    async fn test_guest_cart_claimed_when_user_has_none() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let product = ProductId::new();

        let mut guest_cart = Cart::guest();
        guest_cart.add_item(product, 4).unwrap();
        store.save_cart(&guest_cart).await.unwrap();

        let reconciler = CartMergeReconciler::new(store.clone());
        let outcome = reconciler
            .merge_into_user(user, guest_cart.id)
            .await
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Claimed);

        let claimed = store.cart_for_user(user).await.unwrap().unwrap();
        assert_eq!(claimed.id, guest_cart.id);
        assert_eq!(quantity_of(&claimed, product), 4);
    }

    #[tokio::test]
    async fn test_unknown_guest_cart_is_noop() {
        let store = InMemoryStore::new();
        let reconciler = CartMergeReconciler::new(store);

        let outcome = reconciler
            .merge_into_user(UserId::new(), CartId::new())
            .await
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Nothing);
    }

    #[tokio::test]
    async fn test_owned_cart_is_never_stolen() {
        let store = InMemoryStore::new();
        let victim = UserId::new();
        let attacker = UserId::new();

        let mut victim_cart = Cart::for_user(victim);
        victim_cart.add_item(ProductId::new(), 1).unwrap();
        store.save_cart(&victim_cart).await.unwrap();

        let reconciler = CartMergeReconciler::new(store.clone());
        let outcome = reconciler
            .merge_into_user(attacker, victim_cart.id)
            .await
            .unwrap();

        assert_eq!(outcome, MergeOutcome::Nothing);
        let untouched = store.cart(victim_cart.id).await.unwrap().unwrap();
        assert_eq!(untouched.owner, Some(victim));
    }
}
