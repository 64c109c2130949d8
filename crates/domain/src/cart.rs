//! Carts: the mutable pre-order item list.

use chrono::{DateTime, Utc};
use common::{CartId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// A single line in a cart. Quantities are at least 1; a cart holds at most
/// one entry per product (adding an existing product merges quantities).
///
/// No price is stored here. The price is read from the catalog when the
/// cart is viewed and snapshotted only at checkout, so a cart never goes
/// stale against catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart owned either by a user (at most one cart per user) or by nobody,
/// in which case it is a guest cart identified solely by its [`CartId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    /// `None` marks a guest cart.
    pub owner: Option<UserId>,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart owned by a user.
    pub fn for_user(user_id: UserId) -> Self {
        Self::new(Some(user_id))
    }

    /// Creates an empty guest cart.
    pub fn guest() -> Self {
        Self::new(None)
    }

    fn new(owner: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            owner,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `quantity` of a product, merging into an existing line if the
    /// product is already present. An addition that would overflow the
    /// line's quantity is rejected without changing the cart.
    pub fn add_item(&mut self, product_id: ProductId, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or(DomainError::InvalidQuantity(quantity))?;
            }
            None => self.items.push(CartItem {
                product_id,
                quantity,
            }),
        }
        self.touch();
        Ok(())
    }

    /// Replaces the quantity of an existing line.
    ///
    /// Returns false if the product is not in the cart.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                self.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes a line entirely. Returns false if the product was not present.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Reassigns a guest cart to a user without touching its items.
    pub fn claim(&mut self, user_id: UserId) {
        self.owner = Some(user_id);
        self.touch();
    }

    /// Absorbs another cart's items: quantities are summed for products
    /// already present (saturating at `u32::MAX`), unseen products are
    /// appended. The other cart is consumed; the caller is responsible for
    /// deleting its stored copy.
    pub fn absorb(&mut self, other: Cart) {
        for item in other.items {
            match self
                .items
                .iter_mut()
                .find(|i| i.product_id == item.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => self.items.push(item),
            }
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
