//! Cart repository for database operations.
//!
//! Every user has at most one cart (`carts.user_id` is unique). Carts are
//! created lazily the first time they are needed.

use sqlx::PgPool;

use marketstall_core::{CartId, CartItemId, ProductId, UserId};

use super::{RepositoryError, classify_write_error, quantity_from_row, quantity_to_row};
use crate::models::{Cart, CartItem, CartWithItems};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            quantity: quantity_from_row(row.quantity)?,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating an empty one if they have none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO marketstall.carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await
        .map_err(|e| classify_write_error(e, "cart already exists", "user"))?;

        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id
            FROM marketstall.carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get the user's cart with its items, creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create_with_items(
        &self,
        user_id: UserId,
    ) -> Result<CartWithItems, RepositoryError> {
        let cart = self.get_or_create(user_id).await?;

        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, product_id, quantity
            FROM marketstall.cart_items
            WHERE cart_id = $1
            ORDER BY id
            ",
        )
        .bind(cart.id)
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;

        Ok(CartWithItems { cart, items })
    }

    /// Add a product to a cart.
    ///
    /// Adding the same product twice creates two separate items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO marketstall.cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, cart_id, product_id, quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity_to_row(quantity)?)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify_write_error(e, "cart item already exists", "product"))?;

        row.try_into()
    }

    /// Remove an item from the cart belonging to `user_id`.
    ///
    /// Returns `false` if no such item exists or it sits in someone else's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM marketstall.cart_items ci
            USING marketstall.carts c
            WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
