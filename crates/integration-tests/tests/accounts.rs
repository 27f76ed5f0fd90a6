//! Registration, tokens and profile flows against a real database.
//!
//! Run with `MARKETSTALL_TEST_DATABASE_URL` set and `--include-ignored`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use marketstall_core::Role;
use marketstall_integration_tests::{TEST_PASSWORD, TestApp};

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_register_login_and_profile() {
    let app = TestApp::connect().await;
    let account = app.register(Role::Retailer).await;
    let (access, _) = app.login(&account).await;

    let response = app.get("/user/", Some(&access)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], account.username);
    assert_eq!(response.body["email"], account.email);
    assert_eq!(response.body["role"], "Retailer");
    assert!(response.body["id"].is_i64());
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_duplicate_username_is_rejected() {
    let app = TestApp::connect().await;
    let account = app.register(Role::Customer).await;

    let response = app
        .post(
            "/register/",
            None,
            json!({
                "username": account.username,
                "password": TEST_PASSWORD,
                "email": "other@example.com",
                "role": "Customer",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["username"].is_array());
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::connect().await;
    let account = app.register(Role::Customer).await;

    let response = app
        .post(
            "/token/",
            None,
            json!({ "username": account.username, "password": "not-the-password" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"detail": "No active account found with the given credentials"})
    );
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_refresh_issues_working_access_token() {
    let app = TestApp::connect().await;
    let account = app.register(Role::Customer).await;
    let (_, refresh) = app.login(&account).await;

    let response = app
        .post("/token/refresh/", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let access = response.body["access"].as_str().unwrap().to_string();
    assert_eq!(app.get("/user/", Some(&access)).await.status, StatusCode::OK);

    // A refresh token is not an access token
    assert_eq!(
        app.get("/user/", Some(&refresh)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_profile_update_is_partial_and_role_takes_effect() {
    let app = TestApp::connect().await;
    let (account, access) = app.signed_in(Role::Customer).await;

    let response = app
        .put("/user/", Some(&access), json!({ "role": "Retailer" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"message": "User updated successfully"}));

    let profile = app.get("/user/", Some(&access)).await.body;
    assert_eq!(profile["role"], "Retailer");
    assert_eq!(profile["username"], account.username);
    assert_eq!(profile["email"], account.email);

    // The same token now carries Retailer permissions
    assert_eq!(
        app.get("/cart/", Some(&access)).await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_profile_update_rejects_taken_username() {
    let app = TestApp::connect().await;
    let taken = app.register(Role::Customer).await;
    let (_, access) = app.signed_in(Role::Customer).await;

    let response = app
        .put("/user/", Some(&access), json!({ "username": taken.username }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["username"].is_array());
}

#[tokio::test]
#[ignore = "Requires MARKETSTALL_TEST_DATABASE_URL"]
async fn test_deleted_user_tokens_stop_working() {
    let app = TestApp::connect().await;
    let account = app.register(Role::Customer).await;
    let (access, refresh) = app.login(&account).await;

    sqlx::query("DELETE FROM marketstall.users WHERE username = $1")
        .bind(&account.username)
        .execute(app.pool())
        .await
        .unwrap();

    let response = app.get("/user/", Some(&access)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"detail": "Authentication credentials were not provided."})
    );

    let response = app
        .post("/token/refresh/", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"detail": "Given token not valid for any token type"})
    );
}
