//! Order repository for database operations.
//!
//! An order and its lines are written in a single transaction. Line prices
//! are whatever the caller passes in; the handler snapshots them from the
//! product's current price.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use marketstall_core::{Money, OrderId, OrderItemId, ProductId, UserId};

use super::{RepositoryError, classify_write_error, quantity_from_row, quantity_to_row};
use crate::models::{NewOrderItem, Order, OrderItem, OrderWithItems};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_id: i32,
    total_amount: Money,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            customer_id: UserId::new(row.customer_id),
            total_amount: row.total_amount,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    quantity: i32,
    price: Money,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: quantity_from_row(row.quantity)?,
            price: row.price,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the customer or a
    /// product disappeared before the transaction committed.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        customer_id: UserId,
        total_amount: Money,
        items: &[NewOrderItem],
    ) -> Result<OrderWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order: Order = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO marketstall.orders (customer_id, total_amount)
            VALUES ($1, $2)
            RETURNING id, customer_id, total_amount, created_at
            ",
        )
        .bind(customer_id)
        .bind(total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify_write_error(e, "order already exists", "customer"))?
        .into();

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            lines.push(insert_item(&mut tx, order.id, item).await?);
        }

        tx.commit().await?;

        Ok(OrderWithItems {
            order,
            items: lines,
        })
    }

    /// List one customer's orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, total_amount, created_at
            FROM marketstall.orders
            WHERE customer_id = $1
            ORDER BY id
            ",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// List every order in the store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, total_amount, created_at
            FROM marketstall.orders
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    async fn attach_items(
        &self,
        orders: Vec<OrderRow>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
                   oi.quantity, oi.price
            FROM marketstall.order_items oi
            JOIN marketstall.products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = OrderItem::try_from(row)?;
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|row| {
                let order = Order::from(row);
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }
}

async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<OrderItem, RepositoryError> {
    let row = sqlx::query_as::<_, OrderItemRow>(
        r"
        WITH inserted AS (
            INSERT INTO marketstall.order_items (order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, product_id, quantity, price
        )
        SELECT i.id, i.order_id, i.product_id, p.name AS product_name, i.quantity, i.price
        FROM inserted i
        JOIN marketstall.products p ON p.id = i.product_id
        ",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(quantity_to_row(item.quantity)?)
    .bind(item.price)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| classify_write_error(e, "order item already exists", "product"))?;

    row.try_into()
}
