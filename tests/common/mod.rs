#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use fake::faker::address::en::CityName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

use ticket_booking::{
    config::{Config, DatabaseConfig},
    database::Database,
    router, AppState,
};

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    /// Fresh in-memory database with the schema applied.
    pub async fn spawn() -> TestApp {
        let db = Database::in_memory().await.expect("in-memory database");
        db.run_migrations().await.expect("migrations");
        let state = AppState::with_database(db, Config::default());
        let router = router(state.clone());
        TestApp { state, router }
    }

    /// WAL database file under `dir` behind a multi-connection pool, as in production.
    pub async fn spawn_on_file(dir: &Path) -> TestApp {
        let mut config = Config::default();
        config.database = DatabaseConfig {
            url: format!("sqlite://{}", dir.join("bookings.db").display()),
            pool_size: 5,
        };
        let db = Database::new(&config.database).await.expect("file database");
        db.run_migrations().await.expect("migrations");
        let state = AppState::with_database(db, config);
        let router = router(state.clone());
        TestApp { state, router }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /* ---------- seed helpers ---------- */

    pub async fn venue(&self, capacity: i64) -> i64 {
        let name: String = format!("{} Arena {}", CityName().fake::<String>(), uuid_suffix());
        let (status, body) = self
            .post(
                "/venues",
                json!({
                    "name": name,
                    "address": "1 Main Street",
                    "city": CityName().fake::<String>(),
                    "capacity": capacity
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("venue id")
    }

    pub async fn event(&self, venue_id: i64) -> i64 {
        let (status, body) = self
            .post(
                "/events",
                json!({
                    "name": format!("Concert {}", uuid_suffix()),
                    "description": "Live music",
                    "event_date": (Utc::now() + Duration::days(30)).to_rfc3339(),
                    "venue_id": venue_id
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("event id")
    }

    pub async fn ticket_type(&self, name: &str, price: f64) -> i64 {
        let (status, body) = self
            .post("/ticket-types", json!({ "name": name, "price": price }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("ticket type id")
    }

    pub async fn book(&self, event_id: i64, ticket_type_id: i64, quantity: i64) -> (StatusCode, Value) {
        self.post("/bookings", booking_body(event_id, ticket_type_id, quantity)).await
    }
}

pub fn booking_body(event_id: i64, ticket_type_id: i64, quantity: i64) -> Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    json!({
        "customer_name": name,
        "customer_email": email,
        "event_id": event_id,
        "ticket_type_id": ticket_type_id,
        "quantity": quantity
    })
}

fn uuid_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
