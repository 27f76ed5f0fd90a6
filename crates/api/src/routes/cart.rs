//! Shopping cart endpoints. Customers only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use marketstall_core::CartItemId;

use super::parse_pk;
use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireCustomer;
use crate::resources::cart::{CartItemRequest, CartResponse};
use crate::resources::{ApiJson, MessageResponse, ValidationErrors, missing_pk};
use crate::state::AppState;

fn item_not_found() -> AppError {
    AppError::NotFound("Item not found in cart".to_string())
}

/// `GET /cart/`
///
/// Creates an empty cart on first access.
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Json<CartResponse>> {
    let cart = CartRepository::new(state.pool())
        .get_or_create_with_items(customer.id)
        .await?;

    Ok(Json(cart.into()))
}

/// `POST /cart/`
#[instrument(skip_all)]
pub async fn add(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<impl IntoResponse> {
    let addition = body.validate()?;

    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(customer.id).await?;
    let item = carts
        .add_item(cart.id, addition.product_id, addition.quantity)
        .await
        .map_err(|e| match e {
            RepositoryError::InvalidReference(_) => AppError::Validation(
                ValidationErrors::single("product", missing_pk(addition.product_id)),
            ),
            other => other.into(),
        })?;

    tracing::info!(cart_id = %cart.id, item_id = %item.id, product_id = %item.product_id, "Item added to cart");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Item added to cart")),
    ))
}

/// `DELETE /cart/{pk}/remove/`
#[instrument(skip_all)]
pub async fn remove(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    Path(pk): Path<String>,
) -> Result<StatusCode> {
    let id = CartItemId::new(parse_pk(&pk).ok_or_else(item_not_found)?);

    let removed = CartRepository::new(state.pool())
        .remove_item(id, customer.id)
        .await?;
    if !removed {
        return Err(item_not_found());
    }

    tracing::info!(item_id = %id, "Item removed from cart");

    Ok(StatusCode::NO_CONTENT)
}
