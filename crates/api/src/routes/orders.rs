//! Order endpoints.

use std::collections::HashMap;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use marketstall_core::{Money, ProductId, Role};

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireCustomer};
use crate::models::{NewOrderItem, Product};
use crate::resources::order::{OrderDraft, OrderRequest, OrderResponse};
use crate::resources::{ApiJson, MessageResponse, ValidationErrors, missing_pk};
use crate::state::AppState;

/// `GET /orders/`
///
/// Customers see their own orders; Retailers see every order.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool());
    let orders = match user.role {
        Role::Customer => orders.list_for_customer(user.id).await?,
        Role::Retailer => orders.list_all().await?,
    };

    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// `POST /orders/create/`
///
/// Lines are priced at each product's current price. The confirmation
/// email is best effort and never changes the response.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiJson(body): ApiJson<OrderRequest>,
) -> Result<impl IntoResponse> {
    let draft = body.validate()?;

    let catalog = if draft.lines.is_empty() {
        HashMap::new()
    } else {
        let ids: Vec<ProductId> = draft.lines.iter().map(|line| line.product_id).collect();
        ProductRepository::new(state.pool())
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect()
    };

    let (total_amount, items) = price_order(&draft, &catalog)?;

    let order = OrderRepository::new(state.pool())
        .create(customer.id, total_amount, &items)
        .await
        .map_err(|e| match e {
            // A product was deleted between pricing and insert
            RepositoryError::InvalidReference(_) => AppError::Validation(
                ValidationErrors::single("items", "A referenced product no longer exists."),
            ),
            other => other.into(),
        })?;

    tracing::info!(
        order_id = %order.order.id,
        customer_id = %customer.id,
        total = %order.order.total_amount,
        lines = order.items.len(),
        "Order placed"
    );

    if let Err(err) = state
        .email()
        .send_order_confirmation(&customer.email, &order)
        .await
    {
        tracing::warn!(
            order_id = %order.order.id,
            error = %err,
            "Failed to send order confirmation"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Order placed successfully")),
    ))
}

/// Snapshot line prices from `catalog` and settle the order total.
///
/// An explicit `total_amount` wins; otherwise it is the sum of the lines.
fn price_order(
    draft: &OrderDraft,
    catalog: &HashMap<ProductId, Product>,
) -> std::result::Result<(Money, Vec<NewOrderItem>), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut items = Vec::with_capacity(draft.lines.len());
    let mut computed = Some(Money::ZERO);

    for (index, line) in draft.lines.iter().enumerate() {
        let Some(product) = catalog.get(&line.product_id) else {
            errors.add(
                &format!("items[{index}].product"),
                missing_pk(line.product_id),
            );
            continue;
        };

        computed = computed.and_then(|sum| {
            product
                .price
                .times(line.quantity)
                .and_then(|line_total| sum.plus(line_total))
                .ok()
        });

        items.push(NewOrderItem {
            product_id: line.product_id,
            quantity: line.quantity,
            price: product.price,
        });
    }

    let total = match (draft.total_amount, computed) {
        (Some(total), _) => Some(total),
        (None, Some(sum)) => Some(sum),
        (None, None) => {
            errors.add(
                "total_amount",
                "Ensure that there are no more than 10 digits in total.",
            );
            None
        }
    };

    match total {
        Some(total) if errors.is_empty() => Ok((total, items)),
        _ => Err(errors),
    }
}
