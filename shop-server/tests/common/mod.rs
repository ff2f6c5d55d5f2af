//! Shared helpers for the HTTP integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use shared::models::{Product, ProductCreate};
use shop_server::db::DbService;
use shop_server::services::LocalBlobStore;
use shop_server::{Config, ServerState, build_app};

pub const ADMIN_EMAIL: &str = "admin@shop.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub state: ServerState,
    pub app: Router,
    _uploads: TempDir,
    _data: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `data` of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// Numeric error code of a failure envelope
    pub fn code(&self) -> u64 {
        self.body["code"].as_u64().unwrap_or_default()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::for_tests()).await
    }

    /// Fresh SQLite file per app, so concurrent requests get real connections
    pub async fn with_config(mut config: Config) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        config.database_path = data.path().join("shop.db").to_string_lossy().into_owned();
        let blobs = Arc::new(LocalBlobStore::new(uploads.path(), config.uploads_url()));
        let db = DbService::new(&config.database_path, Duration::from_secs(5))
            .await
            .unwrap();
        let state = ServerState::with_blob_store(config, db, blobs);
        let app = build_app(state.clone());
        Self {
            state,
            app,
            _uploads: uploads,
            _data: data,
        }
    }

    pub fn db(&self) -> &DbService {
        &self.state.db
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, path, None, token)).await
    }

    pub async fn post(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send(request(Method::POST, path, Some(body), token)).await
    }

    pub async fn put(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send(request(Method::PUT, path, Some(body), token)).await
    }

    pub async fn patch(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send(request(Method::PATCH, path, Some(body), token)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, path, None, token)).await
    }

    /// Access token for the bootstrap admin
    pub async fn admin_token(&self) -> String {
        self.state
            .accounts
            .ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register a customer and return its access token
    pub async fn customer_token(&self, email: &str) -> String {
        let res = self
            .post(
                "/api/v1/auth/register",
                json!({
                    "email": email,
                    "password": "secret123",
                    "name": "Test Customer",
                    "phone": "3001234567"
                }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        self.login(email, "secret123").await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .post(
                "/api/v1/auth/login",
                json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        res.data()["access_token"].as_str().unwrap().to_string()
    }

    pub async fn seed_product(&self, name: &str, price: f64, stock: i64) -> Product {
        self.seed_product_with(name, price, stock, false).await
    }

    pub async fn seed_product_with(
        &self,
        name: &str,
        price: f64,
        stock: i64,
        is_featured: bool,
    ) -> Product {
        self.state
            .catalog
            .create(ProductCreate {
                name: name.into(),
                description: format!("{name} description"),
                price,
                weight: 250,
                stock,
                category: "coffee".into(),
                images: Vec::new(),
                is_featured,
            })
            .await
            .unwrap()
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        self.state.catalog.get(product_id).await.unwrap().stock
    }
}

pub fn request(
    method: Method,
    path: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Checkout payload for `(product_id, quantity)` lines
pub fn order_payload(lines: &[(&str, i64)], discount_code: Option<&str>) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(product_id, quantity)| json!({ "product_id": product_id, "quantity": quantity }))
        .collect();
    json!({
        "customer_name": "Laura Gomez",
        "customer_email": "laura@example.com",
        "customer_phone": "3109876543",
        "payment_method": "CONTRA_ENTREGA",
        "shipping_address": {
            "street": "Carrera 43A",
            "number": "1-50",
            "city": "Medellin",
            "department": "Antioquia",
            "zip_code": "050021"
        },
        "items": items,
        "discount_code": discount_code
    })
}
