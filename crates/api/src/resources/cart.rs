//! Cart payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use marketstall_core::{CartId, CartItemId, ProductId, UserId};

use super::{ValidationErrors, bounded_count, pk_field, require};
use crate::models::{CartItem, CartWithItems};

/// `POST /cart/` body.
#[derive(Debug, Default, Deserialize)]
pub struct CartItemRequest {
    pub product: Option<Value>,
    pub quantity: Option<Value>,
}

/// A validated cart addition. The product's existence is checked on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartAddition {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartItemRequest {
    /// Validate the requested product and quantity.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation messages.
    pub fn validate(self) -> Result<CartAddition, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let product = require(&mut errors, "product", self.product)
            .and_then(|v| pk_field(&mut errors, "product", &v));
        let quantity = require(&mut errors, "quantity", self.quantity)
            .and_then(|v| bounded_count(&mut errors, "quantity", &v, 1));

        match (product, quantity) {
            (Some(product), Some(quantity)) => Ok(CartAddition {
                product_id: ProductId::new(product),
                quantity,
            }),
            _ => Err(errors),
        }
    }
}

/// A cart item as returned by `GET /cart/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub cart: CartId,
    pub product: ProductId,
    pub quantity: u32,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            cart: item.cart_id,
            product: item.product_id,
            quantity: item.quantity,
        }
    }
}

/// A cart as returned by `GET /cart/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartResponse {
    pub id: CartId,
    pub user: UserId,
    pub cart_items: Vec<CartItemResponse>,
}

impl From<CartWithItems> for CartResponse {
    fn from(CartWithItems { cart, items }: CartWithItems) -> Self {
        Self {
            id: cart.id,
            user: cart.user_id,
            cart_items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::Cart;
    use crate::resources::REQUIRED;

    fn validate(body: Value) -> Result<CartAddition, ValidationErrors> {
        serde_json::from_value::<CartItemRequest>(body)
            .unwrap()
            .validate()
    }

    #[test]
    fn test_valid_addition_ignores_cart_field() {
        let addition = validate(json!({"product": 4, "quantity": 3, "cart": 99})).unwrap();
        assert_eq!(addition.product_id, ProductId::new(4));
        assert_eq!(addition.quantity, 3);
    }

    #[test]
    fn test_missing_fields() {
        let errors = validate(json!({})).unwrap_err();
        assert_eq!(errors.field("product").unwrap(), [REQUIRED]);
        assert_eq!(errors.field("quantity").unwrap(), [REQUIRED]);
    }

    #[test]
    fn test_quantity_must_be_positive() {
        let errors = validate(json!({"product": 1, "quantity": 0})).unwrap_err();
        assert_eq!(
            errors.field("quantity").unwrap(),
            ["Ensure this value is greater than or equal to 1."]
        );
    }

    #[test]
    fn test_response_shape() {
        let cart = CartWithItems {
            cart: Cart {
                id: CartId::new(1),
                user_id: UserId::new(6),
            },
            items: vec![CartItem {
                id: CartItemId::new(11),
                cart_id: CartId::new(1),
                product_id: ProductId::new(2),
                quantity: 3,
            }],
        };

        assert_eq!(
            serde_json::to_value(CartResponse::from(cart)).unwrap(),
            json!({
                "id": 1,
                "user": 6,
                "cart_items": [{"id": 11, "cart": 1, "product": 2, "quantity": 3}]
            })
        );
    }
}
