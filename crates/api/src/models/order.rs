//! Order domain types.

use chrono::{DateTime, Utc};

use marketstall_core::{Money, OrderId, OrderItemId, ProductId, UserId};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    /// Name of the product, joined in for display.
    pub product_name: String,
    pub quantity: u32,
    /// Unit price captured when the order was placed.
    pub price: Money,
}

/// A line to insert with a new order, already priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
