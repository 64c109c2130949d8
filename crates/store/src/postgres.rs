use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartId, OrderId, ProductId, UserId};
use domain::{Cart, CartItem, Order, OrderStatus, OrderedItem, Product, TokenRecord};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CheckoutPlan, Result, StoreError,
    store::{FulfillmentStore, Transition},
};

/// PostgreSQL-backed fulfillment store.
///
/// The checkout commit runs in a single transaction; each stock decrement
/// is a conditional `UPDATE .. WHERE stock >= quantity`, so the
/// check-then-decrement race is closed by the database regardless of how
/// stale the caller's earlier stock read was.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price: domain::Money::from_cents(row.try_get("price_cents")?),
            stock: u32::try_from(row.try_get::<i32, _>("stock")?).unwrap_or(0),
        })
    }

    fn row_to_cart(row: PgRow) -> Result<Cart> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<CartItem> = serde_json::from_value(items_json)?;
        Ok(Cart {
            id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            owner: row
                .try_get::<Option<Uuid>, _>("user_id")?
                .map(UserId::from_uuid),
            items,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<OrderedItem> = serde_json::from_value(items_json)?;
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            total: domain::Money::from_cents(row.try_get("total_cents")?),
            shipping_address: row.try_get("shipping_address")?,
            status: status
                .parse()
                .map_err(|_| sqlx::Error::Decode(format!("bad status: {status}").into()))?,
            created_at: row.try_get("created_at")?,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, items, total_cents, shipping_address, status, created_at";

#[async_trait]
impl FulfillmentStore for PostgresStore {
    async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, price_cents = EXCLUDED.price_cents, stock = EXCLUDED.stock
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(i32::try_from(product.stock).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT id, name, price_cents, stock FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query(
            "SELECT id, name, price_cents, stock FROM products WHERE id = ANY($1)",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn cart(&self, id: CartId) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, user_id, items, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_cart).transpose()
    }

    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, user_id, items, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_cart).transpose()
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        let items_json = serde_json::to_value(&cart.items)?;
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, items, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET user_id = EXCLUDED.user_id, items = EXCLUDED.items, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.owner.map(|u| u.as_uuid()))
        .bind(items_json)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_cart(&self, id: CartId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn orders_with_status(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> Result<Vec<Order>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 \
                     ORDER BY created_at DESC LIMIT $2"
                ))
                .bind(status.as_str())
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1"
                ))
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Transition> {
        // Single-statement compare-and-set; concurrent callers expecting the
        // same `from` cannot both match the row.
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $3 WHERE id = $1 AND status = $2 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(Transition::Applied(Self::row_to_order(row)?));
        }

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match current {
            Some(status) => Ok(Transition::Superseded {
                current: status
                    .parse()
                    .map_err(|_| sqlx::Error::Decode(format!("bad status: {status}").into()))?,
            }),
            None => Err(StoreError::OrderNotFound(id)),
        }
    }

    async fn commit_checkout(&self, plan: CheckoutPlan) -> Result<Order> {
        plan.validate()?;
        let mut tx = self.pool.begin().await?;

        for decrement in &plan.decrements {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            )
            .bind(decrement.product_id.as_uuid())
            .bind(i32::try_from(decrement.quantity).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the earlier decrements.
                let exists: Option<i32> =
                    sqlx::query_scalar("SELECT 1 FROM products WHERE id = $1")
                        .bind(decrement.product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;
                tracing::debug!(
                    product_id = %decrement.product_id,
                    quantity = decrement.quantity,
                    "stock decrement rejected, rolling back checkout"
                );
                return Err(match exists {
                    Some(_) => StoreError::InsufficientStock(decrement.product_id),
                    None => StoreError::ProductNotFound(decrement.product_id),
                });
            }
        }

        let items_json = serde_json::to_value(&plan.order.items)?;
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_cents, shipping_address, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(plan.order.id.as_uuid())
        .bind(plan.order.user_id.as_uuid())
        .bind(items_json)
        .bind(plan.order.total.cents())
        .bind(&plan.order.shipping_address)
        .bind(plan.order.status.as_str())
        .bind(plan.order.created_at)
        .execute(&mut *tx)
        .await?;

        // The cart must still exist inside this transaction; a zero-row
        // delete means a concurrent checkout already consumed it, and this
        // commit must not create a second order from the same cart.
        let deleted = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(plan.cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            tracing::debug!(
                cart_id = %plan.cart_id,
                "cart already consumed by a concurrent checkout, rolling back"
            );
            return Err(StoreError::CartNotFound(plan.cart_id));
        }

        tx.commit().await?;
        Ok(plan.order)
    }

    async fn put_token(&self, record: &TokenRecord) -> Result<()> {
        // Reissuing supersedes any earlier token for the same email, so at
        // most one token per address is ever redeemable.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM ephemeral_tokens WHERE email = $1")
            .bind(&record.email)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO ephemeral_tokens (token, email, payload, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.token)
        .bind(&record.email)
        .bind(&record.payload)
        .bind(record.expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn take_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        // Atomic get-and-delete: of two concurrent redemptions exactly one
        // row comes back.
        let row = sqlx::query(
            r#"
            DELETE FROM ephemeral_tokens
            WHERE token = $1 AND expires_at > $2
            RETURNING token, email, payload, expires_at
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(TokenRecord {
                token: row.try_get("token")?,
                email: row.try_get("email")?,
                payload: row.try_get("payload")?,
                expires_at: row.try_get::<DateTime<Utc>, _>("expires_at")?,
            })
        })
        .transpose()
    }

    async fn token_for_email(&self, email: &str) -> Result<Option<String>> {
        let token: Option<String> = sqlx::query_scalar(
            "SELECT token FROM ephemeral_tokens WHERE email = $1 AND expires_at > $2",
        )
        .bind(email)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn record_payment_event(&self, event_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO processed_payment_events (event_id) VALUES ($1) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
