//! Cart and order flows against a real database.
//!
//! Run with `MARKETSTALL_TEST_DATABASE_URL` set and `--include-ignored`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use marketstall_core::Role;
use marketstall_integration_tests::TestApp;

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_order_snapshots_prices_and_computes_total() {
    let app = TestApp::connect().await;
    let (_, retailer) = app.signed_in(Role::Retailer).await;
    let mug = app.create_product(&retailer, "4.25", 10).await;
    let pen = app.create_product(&retailer, "1.10", 10).await;
    let (_, customer) = app.signed_in(Role::Customer).await;

    let response = app
        .post(
            "/orders/create/",
            Some(&customer),
            json!({
                "items": [
                    {"product": mug["id"], "quantity": 2},
                    {"product": pen["id"], "quantity": 3},
                ]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body, json!({"message": "Order placed successfully"}));

    // Later price changes do not touch the order
    app.put(
        &format!("/products/{}/update/", mug["id"]),
        Some(&retailer),
        json!({ "price": "99.00" }),
    )
    .await;

    let orders = app.get("/orders/", Some(&customer)).await;
    assert_eq!(orders.status, StatusCode::OK);
    let orders = orders.body.as_array().unwrap().clone();
    assert_eq!(orders.len(), 1);

    let order = &orders[0];
    assert_eq!(order["total_amount"], "11.80");
    let items = order["order_items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["product"], mug["id"]);
    assert_eq!(items[0]["product_name"], mug["name"]);
    assert_eq!(items[0]["price"], "4.25");
    assert_eq!(items[0]["quantity"], 2);

    // Retailers see every order
    let all = app.get("/orders/", Some(&retailer)).await.body;
    assert!(all.as_array().unwrap().iter().any(|o| o["id"] == order["id"]));
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_explicit_total_is_kept() {
    let app = TestApp::connect().await;
    let (_, customer) = app.signed_in(Role::Customer).await;

    let response = app
        .post(
            "/orders/create/",
            Some(&customer),
            json!({ "total_amount": "42.00" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let orders = app.get("/orders/", Some(&customer)).await.body;
    assert_eq!(orders[0]["total_amount"], "42.00");
    assert_eq!(orders[0]["order_items"], json!([]));
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_order_with_unknown_product_is_rejected() {
    let app = TestApp::connect().await;
    let (_, customer) = app.signed_in(Role::Customer).await;

    let response = app
        .post(
            "/orders/create/",
            Some(&customer),
            json!({ "items": [{"product": 2_000_000_000, "quantity": 1}] }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["items[0].product"].is_array());
    assert_eq!(app.get("/orders/", Some(&customer)).await.body, json!([]));
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_retailer_cannot_place_orders() {
    let app = TestApp::connect().await;
    let (_, retailer) = app.signed_in(Role::Retailer).await;

    let response = app
        .post(
            "/orders/create/",
            Some(&retailer),
            json!({ "total_amount": "1.00" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_cart_add_and_remove() {
    let app = TestApp::connect().await;
    let (_, retailer) = app.signed_in(Role::Retailer).await;
    let product = app.create_product(&retailer, "2.00", 4).await;
    let (_, customer) = app.signed_in(Role::Customer).await;

    let cart = app.get("/cart/", Some(&customer)).await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["cart_items"], json!([]));
    let cart_id = cart.body["id"].clone();

    let response = app
        .post(
            "/cart/",
            Some(&customer),
            json!({ "product": product["id"], "quantity": 2 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, json!({"message": "Item added to cart"}));

    let cart = app.get("/cart/", Some(&customer)).await.body;
    assert_eq!(cart["id"], cart_id);
    let items = cart["cart_items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product"], product["id"]);
    assert_eq!(items[0]["quantity"], 2);
    let item_id = items[0]["id"].clone();

    let response = app
        .delete(&format!("/cart/{item_id}/remove/"), Some(&customer))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .delete(&format!("/cart/{item_id}/remove/"), Some(&customer))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"error": "Item not found in cart"}));
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_cart_items_are_private() {
    let app = TestApp::connect().await;
    let (_, retailer) = app.signed_in(Role::Retailer).await;
    let product = app.create_product(&retailer, "2.00", 4).await;
    let (_, owner) = app.signed_in(Role::Customer).await;
    let (_, other) = app.signed_in(Role::Customer).await;

    app.post(
        "/cart/",
        Some(&owner),
        json!({ "product": product["id"], "quantity": 1 }),
    )
    .await;
    let item_id = app.get("/cart/", Some(&owner)).await.body["cart_items"][0]["id"].clone();

    let response = app
        .delete(&format!("/cart/{item_id}/remove/"), Some(&other))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let cart = app.get("/cart/", Some(&owner)).await.body;
    assert_eq!(cart["cart_items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_cart_rejects_unknown_product() {
    let app = TestApp::connect().await;
    let (_, customer) = app.signed_in(Role::Customer).await;

    let response = app
        .post(
            "/cart/",
            Some(&customer),
            json!({ "product": 2_000_000_000, "quantity": 1 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["product"].is_array());
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_failed_confirmation_email_keeps_order() {
    let app = TestApp::connect_with_sender("not an address").await;
    let (_, retailer) = app.signed_in(Role::Retailer).await;
    let product = app.create_product(&retailer, "5.00", 2).await;
    let (_, customer) = app.signed_in(Role::Customer).await;

    let response = app
        .post(
            "/orders/create/",
            Some(&customer),
            json!({ "items": [{"product": product["id"], "quantity": 1}] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, json!({"message": "Order placed successfully"}));

    let orders = app.get("/orders/", Some(&customer)).await.body;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["total_amount"], "5.00");
}
