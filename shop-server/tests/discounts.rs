mod common;

use common::{TestApp, order_payload};
use http::StatusCode;
use serde_json::{Value, json};
use shared::util::now_millis;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn code_payload(code: &str, kind: &str, value: f64) -> Value {
    let now = now_millis();
    json!({
        "code": code,
        "description": format!("{code} promo"),
        "type": kind,
        "value": value,
        "start_date": now - DAY_MS,
        "end_date": now + DAY_MS,
        "is_active": true
    })
}

async fn create_code(app: &TestApp, admin: &str, payload: Value) -> Value {
    let res = app.post("/api/v1/discounts", payload, Some(admin)).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    res.data().clone()
}

async fn validate(app: &TestApp, code: &str, total: f64) -> Value {
    let res = app
        .post(
            "/api/v1/discounts/validate",
            json!({ "code": code, "purchase_total": total }),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    res.data().clone()
}

#[tokio::test]
async fn test_codes_are_stored_uppercase_and_unique() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let created = create_code(&app, &admin, code_payload("welcome10", "PERCENTAGE", 10.0)).await;
    assert_eq!(created["code"], "WELCOME10");
    assert_eq!(created["used_count"], 0);

    let res = app
        .post(
            "/api/v1/discounts",
            code_payload("Welcome10", "FIXED_AMOUNT", 5000.0),
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.code(), 3002);

    let result = validate(&app, " welcome10 ", 100000.0).await;
    assert_eq!(result["valid"], true);
    assert_eq!(result["discount_amount"], 10000.0);
    assert_eq!(result["message"], "Discount code is valid");
}

#[tokio::test]
async fn test_create_rejects_bad_value_and_window() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let res = app
        .post(
            "/api/v1/discounts",
            code_payload("TOOMUCH", "PERCENTAGE", 150.0),
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), 3004);

    let mut payload = code_payload("BACKWARDS", "FIXED_AMOUNT", 1000.0);
    payload["end_date"] = json!(payload["start_date"].as_i64().unwrap() - 1);
    let res = app.post("/api/v1/discounts", payload, Some(&admin)).await;
    assert_eq!(res.code(), 3003);

    let res = app
        .post(
            "/api/v1/discounts",
            code_payload("AB", "FIXED_AMOUNT", 1000.0),
            Some(&admin),
        )
        .await;
    assert_eq!(res.code(), 2);
    assert!(res.body["details"]["code"].is_array());
}

#[tokio::test]
async fn test_validation_messages() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let mut min = code_payload("MIN50K", "FIXED_AMOUNT", 10000.0);
    min["min_purchase"] = json!(50000.0);
    create_code(&app, &admin, min).await;

    let result = validate(&app, "MIN50K", 40000.0).await;
    assert_eq!(result["valid"], false);
    assert_eq!(result["discount_amount"], 0.0);
    assert_eq!(
        result["message"],
        "Purchase amount does not meet minimum requirement"
    );

    let result = validate(&app, "MIN50K", 60000.0).await;
    assert_eq!(result["valid"], true);
    assert_eq!(result["discount_amount"], 10000.0);

    let result = validate(&app, "NOPE", 60000.0).await;
    assert_eq!(result["valid"], false);
    assert_eq!(result["message"], "Discount code not found");

    let mut inactive = code_payload("SLEEPY", "FIXED_AMOUNT", 1000.0);
    inactive["is_active"] = json!(false);
    create_code(&app, &admin, inactive).await;
    let result = validate(&app, "sleepy", 60000.0).await;
    assert_eq!(result["message"], "Discount code is inactive");

    let mut future = code_payload("LATER", "FIXED_AMOUNT", 1000.0);
    future["start_date"] = json!(now_millis() + DAY_MS);
    future["end_date"] = json!(now_millis() + 2 * DAY_MS);
    create_code(&app, &admin, future).await;
    let result = validate(&app, "LATER", 60000.0).await;
    assert_eq!(result["message"], "Discount code not yet valid");

    let mut past = code_payload("GONE", "FIXED_AMOUNT", 1000.0);
    past["start_date"] = json!(now_millis() - 2 * DAY_MS);
    past["end_date"] = json!(now_millis() - DAY_MS);
    create_code(&app, &admin, past).await;
    let result = validate(&app, "GONE", 60000.0).await;
    assert_eq!(result["message"], "Discount code expired");
}

#[tokio::test]
async fn test_fixed_discount_is_clamped_at_checkout() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let product = app.seed_product("Cafe Premium", 50000.0, 5).await;
    let code = create_code(&app, &admin, code_payload("BIGFIX", "FIXED_AMOUNT", 99999.0)).await;

    let res = app
        .post(
            "/api/v1/orders",
            order_payload(&[(&product.id, 1)], Some("bigfix")),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let order = &res.data()["order"];
    assert_eq!(order["subtotal"], 50000.0);
    assert_eq!(order["discount"], 50000.0);
    assert_eq!(order["total"], 0.0);
    assert_eq!(order["discount_code_id"], code["id"]);

    let res = app
        .get(
            &format!("/api/v1/discounts/{}", code["id"].as_str().unwrap()),
            Some(&admin),
        )
        .await;
    assert_eq!(res.data()["used_count"], 1);
}

#[tokio::test]
async fn test_percentage_discount_rounds_to_cents() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let product = app.seed_product("Cafe Molido", 333.33, 5).await;
    create_code(&app, &admin, code_payload("THIRD", "PERCENTAGE", 15.0)).await;

    let res = app
        .post(
            "/api/v1/orders",
            order_payload(&[(&product.id, 1)], Some("THIRD")),
            None,
        )
        .await;
    let order = &res.data()["order"];
    assert_eq!(order["subtotal"], 333.33);
    assert_eq!(order["discount"], 50.0);
    assert_eq!(order["total"], 283.33);
}

#[tokio::test]
async fn test_invalid_code_does_not_block_checkout() {
    let app = TestApp::new().await;
    let product = app.seed_product("Cafe Verde", 20000.0, 5).await;

    let res = app
        .post(
            "/api/v1/orders",
            order_payload(&[(&product.id, 2)], Some("DOESNOTEXIST")),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let order = &res.data()["order"];
    assert_eq!(order["discount"], 0.0);
    assert_eq!(order["total"], 40000.0);
    assert!(order["discount_code_id"].is_null());
}

#[tokio::test]
async fn test_usage_cap_is_enforced_across_orders() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let product = app.seed_product("Cafe Limitado", 20000.0, 5).await;
    let mut once = code_payload("ONCE", "FIXED_AMOUNT", 5000.0);
    once["max_uses"] = json!(1);
    create_code(&app, &admin, once).await;

    let first = app
        .post(
            "/api/v1/orders",
            order_payload(&[(&product.id, 1)], Some("ONCE")),
            None,
        )
        .await;
    assert_eq!(first.data()["order"]["discount"], 5000.0);

    let second = app
        .post(
            "/api/v1/orders",
            order_payload(&[(&product.id, 1)], Some("ONCE")),
            None,
        )
        .await;
    assert_eq!(second.status, StatusCode::CREATED);
    assert_eq!(second.data()["order"]["discount"], 0.0);

    let result = validate(&app, "ONCE", 20000.0).await;
    assert_eq!(result["message"], "Discount code usage limit reached");
}

#[tokio::test]
async fn test_admin_crud() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let code = create_code(&app, &admin, code_payload("EDITME", "PERCENTAGE", 5.0)).await;
    let path = format!("/api/v1/discounts/{}", code["id"].as_str().unwrap());

    let res = app
        .put(&path, json!({ "value": 20.0, "code": "edited" }), Some(&admin))
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["value"], 20.0);
    assert_eq!(res.data()["code"], "EDITED");

    // The resulting percentage is re-checked
    let res = app
        .put(&path, json!({ "value": 250.0 }), Some(&admin))
        .await;
    assert_eq!(res.code(), 3004);

    let res = app.get("/api/v1/discounts?page_size=1", Some(&admin)).await;
    assert_eq!(res.data()["total"], 1);
    assert_eq!(res.data()["discount_codes"].as_array().unwrap().len(), 1);

    let res = app
        .send(common::request(http::Method::DELETE, &path, None, Some(&admin)))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.get(&path, Some(&admin)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), 3001);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_share_single_use_code() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let product = app.seed_product("Cafe Subasta", 20000.0, 10).await;
    let mut once = code_payload("FLASH", "FIXED_AMOUNT", 5000.0);
    once["max_uses"] = json!(1);
    let code = create_code(&app, &admin, once).await;

    let checkout = || {
        app.post(
            "/api/v1/orders",
            order_payload(&[(&product.id, 1)], Some("FLASH")),
            None,
        )
    };
    let (a, b, c, d) = tokio::join!(checkout(), checkout(), checkout(), checkout());

    let mut discounted = 0;
    for res in [a, b, c, d] {
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        if res.data()["order"]["discount"] == 5000.0 {
            discounted += 1;
            assert_eq!(res.data()["order"]["discount_code_id"], code["id"]);
        } else {
            assert_eq!(res.data()["order"]["discount"], 0.0);
            assert!(res.data()["order"]["discount_code_id"].is_null());
        }
    }
    assert_eq!(discounted, 1);
    assert_eq!(app.stock_of(&product.id).await, 6);

    let res = app
        .get(
            &format!("/api/v1/discounts/{}", code["id"].as_str().unwrap()),
            Some(&admin),
        )
        .await;
    assert_eq!(res.data()["used_count"], 1);
}

#[tokio::test]
async fn test_renaming_onto_existing_code_conflicts() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    create_code(&app, &admin, code_payload("TAKEN", "PERCENTAGE", 5.0)).await;
    let other = create_code(&app, &admin, code_payload("FREE", "PERCENTAGE", 5.0)).await;
    let path = format!("/api/v1/discounts/{}", other["id"].as_str().unwrap());

    let res = app.put(&path, json!({ "code": "taken" }), Some(&admin)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.code(), 3002);

    let res = app.get(&path, Some(&admin)).await;
    assert_eq!(res.data()["code"], "FREE");
}
