//! Order payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use marketstall_core::{Money, OrderId, OrderItemId, ProductId, UserId};

use super::{REQUIRED, ValidationErrors, bounded_count, money_field, pk_field, require};
use crate::models::{OrderItem, OrderWithItems};

/// One requested line of `POST /orders/create/`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderLineRequest {
    pub product: Option<Value>,
    pub quantity: Option<Value>,
}

/// `POST /orders/create/` body.
#[derive(Debug, Default, Deserialize)]
pub struct OrderRequest {
    pub total_amount: Option<Value>,
    pub items: Option<Vec<OrderLineRequest>>,
}

/// A validated but not yet priced order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineDraft {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A validated order request.
///
/// Lines still need to be priced against the catalog; `total_amount` is
/// `None` when it should be computed from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub total_amount: Option<Money>,
    pub lines: Vec<OrderLineDraft>,
}

impl OrderRequest {
    /// Validate the order shape. Product existence is checked by the handler.
    ///
    /// Errors on a line are keyed `items[<index>].<field>`.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation messages.
    pub fn validate(self) -> Result<OrderDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let lines_given = self.items.as_ref().is_some_and(|items| !items.is_empty());
        if self.total_amount.is_none() && !lines_given {
            errors.add("total_amount", REQUIRED);
        }

        let total_amount = self
            .total_amount
            .and_then(|v| money_field(&mut errors, "total_amount", &v));

        let mut lines = Vec::new();
        for (index, line) in self.items.unwrap_or_default().into_iter().enumerate() {
            let product_key = format!("items[{index}].product");
            let quantity_key = format!("items[{index}].quantity");

            let product = require(&mut errors, &product_key, line.product)
                .and_then(|v| pk_field(&mut errors, &product_key, &v));
            let quantity = require(&mut errors, &quantity_key, line.quantity)
                .and_then(|v| bounded_count(&mut errors, &quantity_key, &v, 1));

            if let (Some(product), Some(quantity)) = (product, quantity) {
                lines.push(OrderLineDraft {
                    product_id: ProductId::new(product),
                    quantity,
                });
            }
        }

        errors.finish(|| OrderDraft {
            total_amount,
            lines,
        })
    }
}

/// An order line as returned by `GET /orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// An order as returned by `GET /orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer: UserId,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<OrderWithItems> for OrderResponse {
    fn from(OrderWithItems { order, items }: OrderWithItems) -> Self {
        Self {
            id: order.id,
            customer: order.customer_id,
            total_amount: order.total_amount,
            created_at: order.created_at,
            order_items: items.into_iter().map(Into::into).collect(),
        }
    }
}
