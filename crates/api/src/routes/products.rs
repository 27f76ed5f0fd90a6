//! Product catalog endpoints.
//!
//! Listing and detail are public. Mutations require a Retailer and only
//! touch the caller's own products; someone else's product is reported as
//! not found.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use marketstall_core::ProductId;

use super::parse_pk;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireRetailer;
use crate::resources::product::{ProductRequest, ProductResponse};
use crate::resources::{ApiJson, MessageResponse};
use crate::state::AppState;

const PRODUCT_NOT_FOUND: &str = "Product not found";

fn not_found() -> AppError {
    AppError::NotFound(PRODUCT_NOT_FOUND.to_string())
}

/// `GET /products/`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    let products = ProductRepository::new(state.pool()).list().await?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// `GET /products/{pk}/`
pub async fn show(
    State(state): State<AppState>,
    Path(pk): Path<String>,
) -> Result<Json<ProductResponse>> {
    let id = ProductId::new(parse_pk(&pk).ok_or_else(not_found)?);

    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(product.into()))
}

/// `POST /products/create/`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireRetailer(retailer): RequireRetailer,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<impl IntoResponse> {
    let product = body.into_new()?;

    let created = ProductRepository::new(state.pool())
        .create(retailer.id, &product)
        .await?;

    tracing::info!(product_id = %created.id, retailer_id = %retailer.id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Product created successfully")),
    ))
}

/// `PUT /products/{pk}/update/`
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireRetailer(retailer): RequireRetailer,
    Path(pk): Path<String>,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<Json<MessageResponse>> {
    let id = ProductId::new(parse_pk(&pk).ok_or_else(not_found)?);
    let products = ProductRepository::new(state.pool());

    // Ownership is settled before the body is looked at
    products
        .get_owned(id, retailer.id)
        .await?
        .ok_or_else(not_found)?;

    let changes = body.into_changes()?;

    products
        .update_owned(id, retailer.id, &changes)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(product_id = %id, retailer_id = %retailer.id, "Product updated");

    Ok(Json(MessageResponse::new("Product updated successfully")))
}

/// `DELETE /products/{pk}/delete/`
#[instrument(skip_all)]
pub async fn delete(
    State(state): State<AppState>,
    RequireRetailer(retailer): RequireRetailer,
    Path(pk): Path<String>,
) -> Result<StatusCode> {
    let id = ProductId::new(parse_pk(&pk).ok_or_else(not_found)?);

    let deleted = ProductRepository::new(state.pool())
        .delete_owned(id, retailer.id)
        .await?;
    if !deleted {
        return Err(not_found());
    }

    tracing::info!(product_id = %id, retailer_id = %retailer.id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}
