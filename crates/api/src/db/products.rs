//! Product repository for database operations.
//!
//! Mutations are scoped to the owning retailer: updating or deleting a
//! product someone else owns behaves exactly like a missing product.

use sqlx::PgPool;

use marketstall_core::{Money, ProductId, UserId};

use super::{RepositoryError, classify_write_error, quantity_from_row, quantity_to_row};
use crate::models::{NewProduct, Product, ProductChanges};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Money,
    quantity: i32,
    retailer_id: i32,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            quantity: quantity_from_row(row.quantity)?,
            retailer_id: UserId::new(row.retailer_id),
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, quantity, retailer_id
            FROM marketstall.products
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, quantity, retailer_id
            FROM marketstall.products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a product by ID, only if `retailer_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: ProductId,
        retailer_id: UserId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, quantity, retailer_id
            FROM marketstall.products
            WHERE id = $1 AND retailer_id = $2
            ",
        )
        .bind(id)
        .bind(retailer_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get all products whose IDs appear in `ids`. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, quantity, retailer_id
            FROM marketstall.products
            WHERE id = ANY($1)
            ",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create a product owned by `retailer_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the retailer no longer exists.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        retailer_id: UserId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO marketstall.products (name, description, price, quantity, retailer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price, quantity, retailer_id
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(quantity_to_row(product.quantity)?)
        .bind(retailer_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify_write_error(e, "product already exists", "retailer"))?;

        row.try_into()
    }

    /// Apply a partial update to a product owned by `retailer_id`.
    ///
    /// Returns `None` if no such product exists or it belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_owned(
        &self,
        id: ProductId,
        retailer_id: UserId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let quantity = changes.quantity.map(quantity_to_row).transpose()?;
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE marketstall.products
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                quantity = COALESCE($6, quantity)
            WHERE id = $1 AND retailer_id = $2
            RETURNING id, name, description, price, quantity, retailer_id
            ",
        )
        .bind(id)
        .bind(retailer_id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.price)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete a product owned by `retailer_id`.
    ///
    /// Returns `false` if no such product exists or it belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_owned(
        &self,
        id: ProductId,
        retailer_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM marketstall.products
            WHERE id = $1 AND retailer_id = $2
            ",
        )
        .bind(id)
        .bind(retailer_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
