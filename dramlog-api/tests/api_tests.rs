//! Integration tests for dramlog-api catalog endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Entities and bottles
//! - Bottle tastings pagination
//! - Badge definitions
//! - Store registration and price ingest

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use dramlog_common::events::DramlogEvent;
use helpers::TestApp;
use serde_json::json;

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "dramlog-api");
    assert!(body["version"].is_string());
    assert!(body["uptimeSeconds"].is_u64());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Entities and Bottles
// =============================================================================

#[tokio::test]
async fn test_create_and_get_entity() {
    let app = TestApp::new().await;

    let id = app.create_entity("Ardbeg", &["brand", "distiller"]).await;
    let entity = app.entity(id).await;

    assert_eq!(entity["name"], "Ardbeg");
    assert_eq!(entity["type"], json!(["brand", "distiller"]));
    assert_eq!(entity["country"], "Scotland");
    assert_eq!(entity["totalBottles"], 0);
    assert_eq!(entity["totalTastings"], 0);

    let (status, body) = app
        .post("/entities", json!({"name": "Ardbeg", "type": ["brand"]}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_bottle_counts_entities() {
    let app = TestApp::new().await;
    let (bottle, brand, distiller) = app.seed_catalog().await;

    let body = app.bottle(bottle).await;
    assert_eq!(body["name"], "Laphroaig 10");
    assert_eq!(body["category"], "single_malt");
    assert_eq!(body["statedAge"], 10);
    assert_eq!(body["totalTastings"], 0);
    assert_eq!(body["brand"]["id"], brand);
    assert_eq!(body["distillers"][0]["id"], distiller);

    assert_eq!(app.entity(brand).await["totalBottles"], 1);
    assert_eq!(app.entity(distiller).await["totalBottles"], 1);
}

#[tokio::test]
async fn test_create_bottle_validation() {
    let app = TestApp::new().await;
    let brand = app.create_entity("Brand", &["brand"]).await;

    let (status, _) = app
        .post("/bottles", json!({"name": "X", "brand": 4242}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/bottles",
            json!({"name": "X", "brand": brand, "category": "moonshine"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/bottles", json!({"brand": brand})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    // nothing was counted for the rejected bottles
    assert_eq!(app.entity(brand).await["totalBottles"], 0);
}

#[tokio::test]
async fn test_missing_resources_are_404() {
    let app = TestApp::new().await;

    for uri in [
        "/bottles/77",
        "/bottles/77/tastings",
        "/bottles/77/tags",
        "/bottles/77/prices",
        "/entities/77",
        "/tastings/77",
        "/badges/77",
        "/users/77/awards",
        "/users/77/tags",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_bottle_tastings_paged_newest_first() {
    let app = TestApp::new().await;
    let (bottle, _, _) = app.seed_catalog().await;

    let base = Utc::now() - Duration::days(2);
    for hour in 0..3 {
        let (status, _) = app
            .post(
                "/tastings",
                json!({
                    "bottle": bottle,
                    "notes": format!("hour {}", hour),
                    "createdAt": (base + Duration::hours(hour)).to_rfc3339(),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = app
        .get(&format!("/bottles/{}/tastings?perPage=2", bottle))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
    assert_eq!(page["results"][0]["notes"], "hour 2");
    assert_eq!(page["results"][1]["notes"], "hour 1");
    assert_eq!(page["pagination"]["totalPages"], 2);
    assert_eq!(page["pagination"]["totalResults"], 3);

    let (_, page) = app
        .get(&format!("/bottles/{}/tastings?perPage=2&page=2", bottle))
        .await;
    assert_eq!(page["results"].as_array().unwrap().len(), 1);
    assert_eq!(page["results"][0]["notes"], "hour 0");
}

// =============================================================================
// Badges
// =============================================================================

#[tokio::test]
async fn test_badge_crud() {
    let app = TestApp::new().await;

    let id = app
        .create_badge(
            "Islay Explorer",
            json!([{"type": "region", "config": {"country": "Scotland", "region": "Islay"}}]),
        )
        .await;

    let (status, badge) = app.get(&format!("/badges/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(badge["name"], "Islay Explorer");
    assert_eq!(badge["maxLevel"], 25);
    assert_eq!(badge["checks"][0]["type"], "region");
    assert_eq!(badge["checks"][0]["config"]["region"], "Islay");

    let (status, list) = app.get("/badges").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_badge_check_without_config() {
    let app = TestApp::new().await;

    let id = app
        .create_badge("Any Dram", json!([{"type": "everyTasting"}]))
        .await;

    let (_, badge) = app.get(&format!("/badges/{}", id)).await;
    assert_eq!(badge["checks"], json!([{"type": "everyTasting", "config": {}}]));
}

#[tokio::test]
async fn test_badge_validation() {
    let app = TestApp::new().await;
    let every = json!([{"type": "everyTasting", "config": {}}]);

    let (status, body) = app
        .post_admin("/badges", json!({"name": "Empty", "checks": []}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "At least one check is required.");

    let (status, _) = app
        .post_admin(
            "/badges",
            json!({"name": "Too High", "maxLevel": 101, "checks": every}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_admin(
            "/badges",
            json!({"name": "Bad Age", "checks": [{"type": "age", "config": {"minAge": 20, "maxAge": 10}}]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_admin(
            "/badges",
            json!({"name": "Unknown", "checks": [{"type": "vibes", "config": {}}]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.create_badge("Taken", every.clone()).await;
    let (status, _) = app
        .post_admin("/badges", json!({"name": "Taken", "checks": every}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Stores and Prices
// =============================================================================

#[tokio::test]
async fn test_store_price_ingest() {
    let app = TestApp::new().await;
    let (bottle, _, _) = app.seed_catalog().await;

    let (status, store) = app
        .post_admin(
            "/stores",
            json!({"type": "whiskyshop", "name": "The Whisky Shop", "country": "UK"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let store_id = store["id"].as_i64().unwrap();
    assert!(store["lastRunAt"].is_null());

    let mut rx = app.state.event_bus.subscribe();
    let (status, body) = app
        .post_admin(
            &format!("/stores/{}/prices", store_id),
            json!([
                {"name": "LAPHROAIG 10", "price": 4599, "url": "https://shop.example/l10"},
                {"name": "Mystery Dram", "price": 2999, "url": "https://shop.example/md"}
            ]),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["bottleId"], bottle);
    assert!(results[1]["bottleId"].is_null());

    match rx.try_recv().unwrap() {
        DramlogEvent::StorePricesUpdated {
            store_id: id,
            prices_updated,
            ..
        } => {
            assert_eq!(id, store_id);
            assert_eq!(prices_updated, 2);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // a second run the same day replaces the price and the day's history point
    app.post_admin(
        &format!("/stores/{}/prices", store_id),
        json!([{"name": "LAPHROAIG 10", "price": 4299, "url": "https://shop.example/l10"}]),
    )
    .await;

    let (status, prices) = app.get(&format!("/bottles/{}/prices", bottle)).await;
    assert_eq!(status, StatusCode::OK);
    let prices = prices["results"].as_array().unwrap();
    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0]["price"], 4299);
    assert_eq!(prices[0]["storeName"], "The Whisky Shop");

    let history: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_price_history")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(history, 2);

    let last_run: Option<String> =
        sqlx::query_scalar("SELECT last_run_at FROM store WHERE id = ?")
            .bind(store_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert!(last_run.is_some());
}

#[tokio::test]
async fn test_price_ingest_is_atomic() {
    let app = TestApp::new().await;
    let (_, store) = app
        .post_admin("/stores", json!({"type": "shop", "name": "Shop"}))
        .await;
    let store_id = store["id"].as_i64().unwrap();

    let (status, _) = app
        .post_admin(
            &format!("/stores/{}/prices", store_id),
            json!([
                {"name": "Good", "price": 1000, "url": "https://shop.example/good"},
                {"name": "Bad", "price": -5, "url": "https://shop.example/bad"}
            ]),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_price")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_price_ingest_unknown_store() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post_admin(
            "/stores/55/prices",
            json!([{"name": "Any", "price": 100, "url": "https://shop.example/any"}]),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_store_type_conflicts() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post_admin("/stores", json!({"type": "shop", "name": "Shop"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post_admin("/stores", json!({"type": "shop", "name": "Other"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
