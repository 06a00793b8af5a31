//! Test Helper Utilities
//!
//! Each `TestApp` owns a fresh on-disk database in a temp directory, an
//! admin and a regular user, and builds routers over shared state.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use dramlog_api::db::users::create_user;
use dramlog_api::{build_router, AppState};
use dramlog_common::db::init_database;
use dramlog_common::events::EventBus;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

pub struct TestApp {
    /// Keeps the database directory alive for the duration of the test
    _temp_dir: TempDir,
    pub pool: SqlitePool,
    pub state: AppState,
    pub admin_key: String,
    pub user_key: String,
    pub user_id: i64,
}

impl TestApp {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("dramlog.db"))
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let (_, admin_key) = create_user(&mut conn, "admin", true).await.unwrap();
        let (user, user_key) = create_user(&mut conn, "taster", false).await.unwrap();
        drop(conn);

        let state = AppState::new(pool.clone(), EventBus::new(100));

        Self {
            _temp_dir: temp_dir,
            pool,
            state,
            admin_key,
            user_key,
            user_id: user.id,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Send a request and return status plus parsed JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        api_key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send_to(self.router(), method, uri, api_key, body).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None, None).await
    }

    /// POST as the regular user
    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(&self.user_key), Some(body)).await
    }

    /// POST as the admin
    pub async fn post_admin(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(&self.admin_key), Some(body)).await
    }

    /// Additional non-admin user; returns (id, api key)
    pub async fn add_user(&self, username: &str) -> (i64, String) {
        let mut conn = self.pool.acquire().await.unwrap();
        let (user, key) = create_user(&mut conn, username, false).await.unwrap();
        (user.id, key)
    }

    pub async fn create_entity(&self, name: &str, types: &[&str]) -> i64 {
        let (status, body) = self
            .post(
                "/entities",
                json!({
                    "name": name,
                    "type": types,
                    "country": "Scotland",
                    "region": "Islay",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create entity failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    pub async fn create_bottle(
        &self,
        name: &str,
        brand: i64,
        distillers: &[i64],
        category: Option<&str>,
        stated_age: Option<i64>,
    ) -> i64 {
        let (status, body) = self
            .post(
                "/bottles",
                json!({
                    "name": name,
                    "brand": brand,
                    "distillers": distillers,
                    "category": category,
                    "statedAge": stated_age,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create bottle failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    pub async fn create_badge(&self, name: &str, checks: Value) -> i64 {
        let (status, body) = self
            .post_admin("/badges", json!({ "name": name, "checks": checks }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create badge failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    /// Brand + separate distiller + a 10 year single malt; returns
    /// (bottle, brand, distiller)
    pub async fn seed_catalog(&self) -> (i64, i64, i64) {
        let brand = self.create_entity("Laphroaig", &["brand"]).await;
        let distiller = self
            .create_entity("Laphroaig Distillery", &["distiller"])
            .await;
        let bottle = self
            .create_bottle(
                "Laphroaig 10",
                brand,
                &[distiller],
                Some("single_malt"),
                Some(10),
            )
            .await;
        (bottle, brand, distiller)
    }

    pub async fn bottle(&self, id: i64) -> Value {
        let (status, body) = self.get(&format!("/bottles/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    pub async fn entity(&self, id: i64) -> Value {
        let (status, body) = self.get(&format!("/entities/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    pub async fn tasting_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasting")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// Send a request through an already built router
pub async fn send_to(
    app: Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
