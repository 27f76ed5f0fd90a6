//! Router behavior that resolves before any database access.

use axum::http::{Method, StatusCode};
use serde_json::json;

use marketstall_integration_tests::TestApp;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::offline();

    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/health/", None).await.status, StatusCode::OK);
    assert_eq!(
        app.get("/health/ready/", None).await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_customer_and_retailer_routes_reject_anonymous_callers() {
    let app = TestApp::offline();

    for (method, uri) in [
        (Method::GET, "/user"),
        (Method::GET, "/orders/"),
        (Method::POST, "/orders/create/"),
        (Method::GET, "/cart/"),
        (Method::POST, "/products/create/"),
        (Method::DELETE, "/products/7/delete/"),
    ] {
        let response = app.request(method.clone(), uri, None, Some(json!({}))).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(response.body["detail"].is_string(), "{method} {uri}");
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::offline();

    let response = app.get("/cart/", Some("not-a-real-token")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"detail": "Given token not valid for any token type"})
    );
}

#[tokio::test]
async fn test_registration_validates_before_storing() {
    let app = TestApp::offline();

    let response = app
        .post(
            "/register/",
            None,
            json!({
                "username": "bad name!",
                "password": "short",
                "email": "nope",
                "role": "Admin",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    for field in ["username", "password", "email", "role"] {
        assert!(response.body[field].is_array(), "{field}: {}", response.body);
    }
    assert_eq!(
        response.body["role"],
        json!(["\"Admin\" is not a valid choice."])
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::offline();
    assert_eq!(app.get("/admin/", None).await.status, StatusCode::NOT_FOUND);
}
