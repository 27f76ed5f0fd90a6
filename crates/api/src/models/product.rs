//! Product catalog domain types.

use marketstall_core::{Money, ProductId, UserId};

/// A catalog entry owned by a retailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Current unit price. Orders snapshot this at placement time.
    pub price: Money,
    /// Units in stock. Informational only; orders do not decrement it.
    pub quantity: u32,
    /// The retailer who created the product.
    pub retailer_id: UserId,
}

/// Fields for a new product. The owner is supplied separately.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub quantity: u32,
}

/// Partial update to a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub quantity: Option<u32>,
}
