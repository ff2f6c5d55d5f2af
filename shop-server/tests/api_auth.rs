mod common;

use axum::body::Body;
use common::TestApp;
use http::{Method, Request, StatusCode, header};
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let res = app.get("/api/v1/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert!(res.body["version"].is_string());
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new().await;
    let token = app.customer_token("Maria@Example.com").await;

    let res = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["email"], "maria@example.com");
    assert_eq!(res.data()["role"], "CUSTOMER");
    assert!(res.data().get("password_hash").is_none());
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new().await;
    let token = app.customer_token("perfil@example.com").await;

    let res = app
        .put(
            "/api/v1/users/me",
            json!({ "name": "Maria Lopez", "phone": "3115550000" }),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["name"], "Maria Lopez");
    assert_eq!(res.data()["phone"], "3115550000");
    assert_eq!(res.data()["email"], "perfil@example.com");

    let res = app
        .put("/api/v1/users/me", json!({ "name": "M" }), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), 2);

    let res = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(res.data()["name"], "Maria Lopez");

    let res = app
        .put("/api/v1/users/me", json!({ "name": "Nadie" }), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_payloads() {
    let app = TestApp::new().await;
    app.customer_token("dup@example.com").await;

    let res = app
        .post(
            "/api/v1/auth/register",
            json!({
                "email": "DUP@example.com",
                "password": "another1",
                "name": "Someone",
                "phone": "1"
            }),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.code(), 1006);

    let res = app
        .post(
            "/api/v1/auth/register",
            json!({ "email": "x@example.com", "password": "123", "name": "X", "phone": "1" }),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), 2);
    assert!(res.body["details"]["password"].is_array());
    assert!(res.body["details"]["name"].is_array());
}

#[tokio::test]
async fn test_malformed_json_is_invalid_request() {
    let app = TestApp::new().await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.send(req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), 5);
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let app = TestApp::new().await;

    let res = app.get("/api/v1/users/me", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), 1001);

    let res = app.get("/api/v1/users/me", Some("garbage")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), 1004);
}

#[tokio::test]
async fn test_refresh_issues_working_access_token() {
    let app = TestApp::new().await;
    app.customer_token("refresh@example.com").await;

    let res = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": "refresh@example.com", "password": "secret123" }),
            None,
        )
        .await;
    let access = res.data()["access_token"].as_str().unwrap().to_string();
    let refresh = res.data()["refresh_token"].as_str().unwrap().to_string();

    // An access token is not accepted as a refresh token
    let res = app
        .post("/api/v1/auth/refresh", json!({ "refresh_token": access }), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .post("/api/v1/auth/refresh", json!({ "refresh_token": refresh }), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let new_access = res.data()["access_token"].as_str().unwrap();

    let res = app.get("/api/v1/users/me", Some(new_access)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_rate_limit() {
    let app = TestApp::new().await;
    app.customer_token("victim@example.com").await;

    let attempt = || {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(
                json!({ "email": "victim@example.com", "password": "wrong-pass" }).to_string(),
            ))
            .unwrap()
    };

    for _ in 0..5 {
        let res = app.send(attempt()).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.code(), 1002);
    }

    let res = app.send(attempt()).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.code(), 6);
    assert!(
        res.body["message"]
            .as_str()
            .unwrap()
            .starts_with("Too many login attempts")
    );
    let retry_after: u64 = res.headers[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 15 * 60);

    // Other clients are unaffected
    let res = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": "victim@example.com", "password": "secret123" }),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    let app = TestApp::new().await;
    let token = app.customer_token("shopper@example.com").await;

    let res = app
        .post(
            "/api/v1/products",
            json!({
                "name": "Cafe Especial",
                "description": "Tostion media",
                "price": 32000,
                "weight": 500,
                "stock": 10,
                "category": "coffee"
            }),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), 2002);

    let res = app.get("/api/v1/orders", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = TestApp::new().await;
    let res = app.get("/api/v1/health", None).await;
    assert!(res.headers.contains_key("x-request-id"));
}
