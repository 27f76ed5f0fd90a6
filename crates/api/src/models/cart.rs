//! Shopping cart domain types.

use marketstall_core::{CartId, CartItemId, ProductId, UserId};

/// A user's staging cart. Each user has at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
}

/// A product selection inside a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart together with its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartWithItems {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}
