//! Integration tests for Marketstall.
//!
//! Requests are driven through the full application service in-process,
//! with the same layers the server binary uses (rate limiting aside).
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests that never reach the database
//! cargo test -p marketstall-integration-tests
//!
//! # Database-backed flows (migrations are applied automatically)
//! MARKETSTALL_TEST_DATABASE_URL=postgres://... \
//!     cargo test -p marketstall-integration-tests -- --include-ignored
//! ```

use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use marketstall_api::config::{ApiConfig, EmailConfig, TokenConfig};
use marketstall_api::routes::RateLimiting;
use marketstall_api::state::AppState;
use marketstall_core::Role;

/// Environment variable naming the database for end-to-end tests.
pub const TEST_DATABASE_URL: &str = "MARKETSTALL_TEST_DATABASE_URL";

/// Password used for every account the tests register.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// A status code and JSON body (`Null` when the body is empty or not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// An account registered through the API.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// The application under test.
pub struct TestApp {
    state: AppState,
}

fn test_config(database_url: &str) -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from(database_url.to_string()),
        host: [127, 0, 0, 1].into(),
        port: 8000,
        tokens: TokenConfig {
            secret: SecretString::from("Vq7mZ2xR9kLp4tWc8NbY1sHd6JfG3aEu"),
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
    }
}

impl TestApp {
    /// An app whose pool never connects.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be built.
    #[must_use]
    pub fn offline() -> Self {
        let url = "postgres://marketstall@127.0.0.1:1/marketstall";
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(url)
            .expect("Failed to build lazy pool");

        Self::with_pool(url, pool)
    }

    /// An app over `MARKETSTALL_TEST_DATABASE_URL` with migrations applied.
    ///
    /// # Panics
    ///
    /// Panics if the variable is unset or the database is unreachable.
    pub async fn connect() -> Self {
        Self::connect_with_sender("webmaster@localhost").await
    }

    /// Like [`TestApp::connect`], with a custom email sender address.
    ///
    /// # Panics
    ///
    /// Panics if the variable is unset or the database is unreachable.
    pub async fn connect_with_sender(from_address: &str) -> Self {
        let url = std::env::var(TEST_DATABASE_URL)
            .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL} must be set for database tests"));
        let pool = PgPool::connect(&url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("../api/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let mut config = test_config(&url);
        config.email.from_address = from_address.to_string();
        Self::with_config(config, pool)
    }

    fn with_pool(url: &str, pool: PgPool) -> Self {
        Self::with_config(test_config(url), pool)
    }

    fn with_config(config: ApiConfig, pool: PgPool) -> Self {
        let state = AppState::new(config, pool).expect("Failed to initialize application state");
        Self { state }
    }

    /// The database pool behind the app.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.state.pool()
    }

    /// Send a request, optionally with a bearer token and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = marketstall_api::app(self.state.clone(), RateLimiting::Disabled)
            .oneshot(request)
            .await
            .expect("Service is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        TestResponse {
            status,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register a fresh account with a unique username.
    ///
    /// # Panics
    ///
    /// Panics if registration does not succeed.
    pub async fn register(&self, role: Role) -> Account {
        let tag = Uuid::new_v4().simple().to_string();
        let account = Account {
            username: format!("{}_{tag}", role.as_str().to_lowercase()),
            email: format!("{tag}@example.com"),
            role,
        };

        let response = self
            .post(
                "/register/",
                None,
                json!({
                    "username": account.username,
                    "password": TEST_PASSWORD,
                    "email": account.email,
                    "role": role.as_str(),
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        account
    }

    /// Obtain a token pair for `account`, returning `(access, refresh)`.
    ///
    /// # Panics
    ///
    /// Panics if login does not succeed.
    pub async fn login(&self, account: &Account) -> (String, String) {
        let response = self
            .post(
                "/token/",
                None,
                json!({ "username": account.username, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

        let token = |key: &str| {
            response.body[key]
                .as_str()
                .expect("token missing from response")
                .to_string()
        };
        (token("access"), token("refresh"))
    }

    /// Register and log in, returning the account and its access token.
    pub async fn signed_in(&self, role: Role) -> (Account, String) {
        let account = self.register(role).await;
        let (access, _) = self.login(&account).await;
        (account, access)
    }

    /// Create a product as `retailer_token` and return its listing entry.
    ///
    /// # Panics
    ///
    /// Panics if creation fails or the product is not listed afterwards.
    pub async fn create_product(&self, retailer_token: &str, price: &str, quantity: u32) -> Value {
        let name = format!("Item {}", Uuid::new_v4().simple());
        let response = self
            .post(
                "/products/create/",
                Some(retailer_token),
                json!({
                    "name": name,
                    "description": "Test item",
                    "price": price,
                    "quantity": quantity,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        self.get("/products/", None)
            .await
            .body
            .as_array()
            .and_then(|products| products.iter().find(|p| p["name"] == name).cloned())
            .expect("created product is listed")
    }
}
