//! Product payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use marketstall_core::{Money, ProductId, UserId};

use super::{ValidationErrors, bounded_count, money_field, require, text_field};
use crate::models::{NewProduct, Product, ProductChanges};

/// Maximum product name length.
pub const MAX_NAME_CHARS: usize = 100;

/// `POST /products/create/` and `PUT /products/{pk}/update/` body.
///
/// Numeric fields arrive as raw JSON so a bad value is reported on its
/// field instead of failing the whole body.
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Value>,
    pub quantity: Option<Value>,
}

impl ProductRequest {
    /// Validate a full product for creation. Every field is required.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation messages.
    pub fn into_new(self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = require(&mut errors, "name", self.name)
            .and_then(|v| text_field(&mut errors, "name", v, Some(MAX_NAME_CHARS)));
        let description = require(&mut errors, "description", self.description)
            .and_then(|v| text_field(&mut errors, "description", v, None));
        let price = require(&mut errors, "price", self.price)
            .and_then(|v| money_field(&mut errors, "price", &v));
        let quantity = require(&mut errors, "quantity", self.quantity)
            .and_then(|v| bounded_count(&mut errors, "quantity", &v, 0));

        match (name, description, price, quantity) {
            (Some(name), Some(description), Some(price), Some(quantity)) => Ok(NewProduct {
                name,
                description,
                price,
                quantity,
            }),
            _ => Err(errors),
        }
    }

    /// Validate whichever fields were supplied, for a partial update.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation messages.
    pub fn into_changes(self) -> Result<ProductChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = ProductChanges {
            name: self
                .name
                .and_then(|v| text_field(&mut errors, "name", v, Some(MAX_NAME_CHARS))),
            description: self
                .description
                .and_then(|v| text_field(&mut errors, "description", v, None)),
            price: self
                .price
                .and_then(|v| money_field(&mut errors, "price", &v)),
            quantity: self
                .quantity
                .and_then(|v| bounded_count(&mut errors, "quantity", &v, 0)),
        };

        errors.finish(|| changes)
    }
}

/// A product as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub quantity: u32,
    pub retailer: UserId,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            quantity: product.quantity,
            retailer: product.retailer_id,
        }
    }
}
