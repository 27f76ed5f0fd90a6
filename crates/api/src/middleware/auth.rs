//! Authentication and role checks.
//!
//! [`authorize`] is the synchronous access predicate. The extractors
//! ([`RequireAuth`], [`RequireCustomer`], [`RequireRetailer`]) resolve the
//! bearer token to a [`CurrentUser`] and then apply it.
//!
//! The user is loaded from the database on every request, so a role change
//! or a deleted account takes effect immediately even while old tokens are
//! still within their lifetime.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use marketstall_core::Role;

use crate::error::{AppError, NOT_AUTHENTICATED, PERMISSION_DENIED, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Why a request was refused by [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    /// No authenticated user (401).
    #[error("authentication required")]
    Unauthenticated,
    /// Authenticated, but not with the required role (403).
    #[error("requires role {required}")]
    WrongRole {
        /// The role the action needs.
        required: Role,
    },
}

impl From<AccessDenied> for AppError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => Self::Unauthorized(NOT_AUTHENTICATED.to_string()),
            AccessDenied::WrongRole { .. } => Self::Forbidden(PERMISSION_DENIED.to_string()),
        }
    }
}

/// Decide whether `user` may proceed.
///
/// `required` of `None` admits any authenticated user.
///
/// # Errors
///
/// Returns `AccessDenied::Unauthenticated` if there is no user, and
/// `AccessDenied::WrongRole` if the user's role differs from `required`.
pub fn authorize(
    user: Option<&CurrentUser>,
    required: Option<Role>,
) -> Result<&CurrentUser, AccessDenied> {
    let user = user.ok_or(AccessDenied::Unauthenticated)?;
    match required {
        Some(role) if user.role != role => Err(AccessDenied::WrongRole { required: role }),
        _ => Ok(user),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `Ok(None)` when there is no header or it uses another scheme.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Ok(Some(token))
        }
        (Some(scheme), _, _) if scheme.eq_ignore_ascii_case("bearer") => Err(
            AppError::Unauthorized(
                "Authorization header must contain two space-delimited values".to_string(),
            ),
        ),
        _ => Ok(None),
    }
}

/// Resolve the request's bearer token and apply [`authorize`].
async fn resolve(
    parts: &Parts,
    state: &AppState,
    required: Option<Role>,
) -> Result<CurrentUser, AppError> {
    let user = match bearer_token(&parts.headers)? {
        None => None,
        Some(token) => {
            match AuthService::new(state.pool(), state.tokens())
                .authenticate(token)
                .await
            {
                Ok(user) => Some(CurrentUser::from(user)),
                Err(AuthError::UserNotFound) => None,
                Err(err) => return Err(err.into()),
            }
        }
    };

    let user = authorize(user.as_ref(), required)?;

    Span::current().record("user_id", user.id.as_i32());
    set_sentry_user(&user.id, user.username.as_str(), Some(user.email.as_str()));

    Ok(user.clone())
}

/// Extractor that requires any authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state, None).await.map(Self)
    }
}

/// Extractor that requires an authenticated Customer.
pub struct RequireCustomer(pub CurrentUser);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state, Some(Role::Customer)).await.map(Self)
    }
}

/// Extractor that requires an authenticated Retailer.
pub struct RequireRetailer(pub CurrentUser);

impl FromRequestParts<AppState> for RequireRetailer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state, Some(Role::Retailer)).await.map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use marketstall_core::{Email, UserId, Username};

    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            username: Username::parse("someone").unwrap(),
            email: Email::parse("someone@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_authorize_requires_user() {
        assert_eq!(authorize(None, None), Err(AccessDenied::Unauthenticated));
        assert_eq!(
            authorize(None, Some(Role::Retailer)),
            Err(AccessDenied::Unauthenticated)
        );
    }

    #[test]
    fn test_authorize_any_role() {
        let customer = user(Role::Customer);
        let retailer = user(Role::Retailer);
        assert!(authorize(Some(&customer), None).is_ok());
        assert!(authorize(Some(&retailer), None).is_ok());
    }

    #[test]
    fn test_authorize_specific_role() {
        let customer = user(Role::Customer);
        assert_eq!(
            authorize(Some(&customer), Some(Role::Customer)).unwrap(),
            &customer
        );
        assert_eq!(
            authorize(Some(&customer), Some(Role::Retailer)),
            Err(AccessDenied::WrongRole {
                required: Role::Retailer
            })
        );
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).unwrap().is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&headers).unwrap().is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer a b"));
        assert!(bearer_token(&headers).is_err());
    }
}
