//! Product catalog flows against a real database.
//!
//! Run with `MARKETSTALL_TEST_DATABASE_URL` set and `--include-ignored`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use marketstall_core::Role;
use marketstall_integration_tests::TestApp;

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_retailer_creates_product_visible_to_everyone() {
    let app = TestApp::connect().await;
    let (_, token) = app.signed_in(Role::Retailer).await;
    let me = app.get("/user/", Some(&token)).await.body;

    let product = app.create_product(&token, "19.9", 5).await;
    assert_eq!(product["price"], "19.90");
    assert_eq!(product["quantity"], 5);
    assert_eq!(product["retailer"], me["id"]);

    let detail = app
        .get(&format!("/products/{}/", product["id"]), None)
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body, product);
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_customer_cannot_create_products() {
    let app = TestApp::connect().await;
    let (_, token) = app.signed_in(Role::Customer).await;

    let response = app
        .post(
            "/products/create/",
            Some(&token),
            json!({"name": "Mug", "description": "", "price": "4.00", "quantity": 1}),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_product_fields_are_validated() {
    let app = TestApp::connect().await;
    let (_, token) = app.signed_in(Role::Retailer).await;

    let response = app
        .post(
            "/products/create/",
            Some(&token),
            json!({"name": "Mug", "description": "", "price": "-1", "quantity": "many"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["price"].is_array());
    assert!(response.body["quantity"].is_array());
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_owner_updates_and_deletes_product() {
    let app = TestApp::connect().await;
    let (_, token) = app.signed_in(Role::Retailer).await;
    let product = app.create_product(&token, "10.00", 3).await;
    let id = &product["id"];

    let response = app
        .put(
            &format!("/products/{id}/update/"),
            Some(&token),
            json!({ "price": "12.50" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let detail = app.get(&format!("/products/{id}/"), None).await.body;
    assert_eq!(detail["price"], "12.50");
    assert_eq!(detail["name"], product["name"]);
    assert_eq!(detail["quantity"], 3);

    let response = app
        .delete(&format!("/products/{id}/delete/"), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.get(&format!("/products/{id}/"), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"error": "Product not found"}));
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_other_retailers_product_is_not_found() {
    let app = TestApp::connect().await;
    let (_, owner) = app.signed_in(Role::Retailer).await;
    let (_, rival) = app.signed_in(Role::Retailer).await;
    let product = app.create_product(&owner, "3.00", 1).await;
    let id = &product["id"];

    let response = app
        .put(
            &format!("/products/{id}/update/"),
            Some(&rival),
            json!({ "price": "0.01" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .delete(&format!("/products/{id}/delete/"), Some(&rival))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let detail = app.get(&format!("/products/{id}/"), None).await.body;
    assert_eq!(detail["price"], "3.00");
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_update_checks_ownership_before_body() {
    let app = TestApp::connect().await;
    let (_, owner) = app.signed_in(Role::Retailer).await;
    let (_, rival) = app.signed_in(Role::Retailer).await;
    let product = app.create_product(&owner, "3.00", 1).await;

    let response = app
        .put(
            &format!("/products/{}/update/", product["id"]),
            Some(&rival),
            json!({ "price": "abc" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"error": "Product not found"}));

    let response = app
        .put(
            "/products/2000000000/update/",
            Some(&rival),
            json!({ "quantity": -1 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"error": "Product not found"}));

    // The owner still gets field errors
    let response = app
        .put(
            &format!("/products/{}/update/", product["id"]),
            Some(&owner),
            json!({ "price": "abc" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["price"].is_array());
}
