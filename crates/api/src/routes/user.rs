//! Current user profile endpoints.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::resources::user::{UserResponse, UserUpdateRequest};
use crate::resources::{ApiJson, MessageResponse, ValidationErrors};
use crate::state::AppState;

/// `GET /user/`
///
/// The extractor already loaded the user fresh from the database.
pub async fn show(RequireAuth(current): RequireAuth) -> Json<UserResponse> {
    Json(UserResponse::from(&current))
}

/// `PUT /user/`
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(body): ApiJson<UserUpdateRequest>,
) -> Result<Json<MessageResponse>> {
    let changes = body.validate()?;

    if !changes.is_empty() {
        UserRepository::new(state.pool())
            .update(current.id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => {
                    AppError::Validation(ValidationErrors::single("username", message))
                }
                other => other.into(),
            })?;
        tracing::info!(user_id = %current.id, "User profile updated");
    }

    Ok(Json(MessageResponse::new("User updated successfully")))
}
