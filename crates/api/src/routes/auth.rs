//! Registration and token endpoints.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use crate::error::Result;
use crate::resources::user::{AccessResponse, RefreshRequest, RegisterRequest, TokenRequest};
use crate::resources::{ApiJson, MessageResponse};
use crate::services::auth::{AuthService, TokenPair};
use crate::state::AppState;

/// `POST /register/`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let registration = body.validate()?;

    let user = AuthService::new(state.pool(), state.tokens())
        .register(
            &registration.username,
            &registration.email,
            registration.role,
            &registration.password,
        )
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// `POST /token/`
#[instrument(skip_all)]
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> Result<Json<TokenPair>> {
    let (username, password) = body.validate()?;

    let pair = AuthService::new(state.pool(), state.tokens())
        .login(&username, &password)
        .await
        .inspect_err(|_| tracing::info!(username = %username, "Login failed"))?;

    Ok(Json(pair))
}

/// `POST /token/refresh/`
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<Json<AccessResponse>> {
    let refresh = body.validate()?;

    let access = AuthService::new(state.pool(), state.tokens())
        .refresh(&refresh)
        .await?;

    Ok(Json(AccessResponse { access }))
}
