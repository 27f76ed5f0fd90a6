//! Marketstall API library.
//!
//! This crate provides the REST backend as a library, allowing the router
//! to be tested in-process and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod resources;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, body::Body, http::Request};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use crate::middleware::request_id_middleware;
use crate::routes::RateLimiting;
use crate::state::AppState;

/// Build the complete application service.
///
/// Trailing slashes are trimmed before routing, so `/products/` and
/// `/products` reach the same handler. The normalization has to wrap the
/// router from the outside; a layer added with `Router::layer` runs after
/// the route has already been matched.
pub fn app(state: AppState, rate_limiting: RateLimiting) -> NormalizePath<Router> {
    let router = Router::new()
        .merge(routes::routes(rate_limiting))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = Empty,
                    user_id = Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;
    use marketstall_core::UserId;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{ApiConfig, EmailConfig, TokenConfig};
    use crate::error::{INVALID_TOKEN, NOT_AUTHENTICATED};

    /// State over a pool that never connects; requests that reach the
    /// database fail, everything rejected earlier is fully exercised.
    fn test_state() -> AppState {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://marketstall@127.0.0.1:1/marketstall"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            tokens: TokenConfig {
                secret: SecretString::from("k3Q9vTz1LmX8pW2rYc7NbF4hJd6GsA0e"),
                access_ttl: Duration::from_secs(300),
                refresh_ttl: Duration::from_secs(86_400),
            },
            email: EmailConfig {
                smtp: None,
                from_address: "webmaster@localhost".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://marketstall@127.0.0.1:1/marketstall")
            .unwrap();

        AppState::new(config, pool).unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app(test_state(), RateLimiting::Disabled)
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_with_and_without_trailing_slash() {
        for uri in ["/health", "/health/"] {
            let response = app(test_state(), RateLimiting::Disabled)
                .oneshot(get(uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&bytes[..], b"ok");
        }
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let response = app(test_state(), RateLimiting::Disabled)
            .oneshot(get("/health"))
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_database() {
        let (status, _) = send(get("/health/ready/")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = send(get("/nowhere/")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let cases = [
            (Method::GET, "/user/"),
            (Method::PUT, "/user/"),
            (Method::GET, "/orders/"),
            (Method::POST, "/orders/create/"),
            (Method::GET, "/cart/"),
            (Method::POST, "/cart/"),
            (Method::DELETE, "/cart/1/remove/"),
            (Method::POST, "/products/create/"),
            (Method::PUT, "/products/1/update/"),
            (Method::DELETE, "/products/1/delete/"),
        ];

        for (method, uri) in cases {
            let request = Request::builder()
                .method(method.clone())
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body, json!({"detail": NOT_AUTHENTICATED}), "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let request = Request::get("/user/")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"detail": INVALID_TOKEN}));
    }

    #[tokio::test]
    async fn test_register_reports_missing_fields() {
        let (status, body) = send(post_json("/register/", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("username").is_some());
        assert!(body.get("password").is_some());
        assert!(body.get("email").is_some());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, body) = send(post_json("/register/", "{\"username\":")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("detail").is_some());
    }

    #[tokio::test]
    async fn test_token_requires_credentials() {
        let (status, body) = send(post_json("/token/", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("username").is_some());
        assert!(body.get("password").is_some());
    }

    #[tokio::test]
    async fn test_refresh_rejects_bogus_and_access_tokens() {
        let (status, body) = send(post_json("/token/refresh/", r#"{"refresh":"bogus"}"#)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"detail": INVALID_TOKEN}));

        let pair = test_state().tokens().issue_pair(UserId::new(1)).unwrap();
        let payload = json!({ "refresh": pair.access }).to_string();
        let (status, _) = send(post_json("/token/refresh/", &payload)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_numeric_product_pk_is_not_found() {
        let (status, body) = send(get("/products/abc/")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Product not found"}));
    }
}
