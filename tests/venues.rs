mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn root_and_health_respond() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["bookings"], "/bookings");

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn creates_and_fetches_a_venue() {
    let app = TestApp::spawn().await;

    let (status, venue) = app
        .post(
            "/venues",
            json!({ "name": "Main Hall", "address": "5 River Rd", "city": "Almaty", "capacity": 250 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(venue["capacity"], 250);

    let id = venue["id"].as_i64().unwrap();
    let (status, fetched) = app.get(&format!("/venues/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Main Hall");
    assert_eq!(fetched["event_count"], 0);
    assert_eq!(fetched["events"], json!([]));
}

#[tokio::test]
async fn rejects_non_positive_capacity() {
    let app = TestApp::spawn().await;

    for capacity in [0, -10] {
        let (status, body) = app
            .post(
                "/venues",
                json!({ "name": "Tiny", "address": "x", "city": "y", "capacity": capacity }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("Capacity must be greater than 0"));
    }

    let (_, venues) = app.get("/venues").await;
    assert_eq!(venues, json!([]));
}

#[tokio::test]
async fn duplicate_venue_name_conflicts() {
    let app = TestApp::spawn().await;
    let body = json!({ "name": "Opera", "address": "1 Square", "city": "Astana", "capacity": 100 });

    let (status, _) = app.post("/venues", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = app.post("/venues", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(error["detail"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::spawn().await;

    let (status, body) = app.post("/venues", json!({ "name": "No capacity" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn unknown_venue_is_not_found() {
    let app = TestApp::spawn().await;

    for uri in ["/venues/999", "/venues/999/events", "/venues/999/occupancy"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["detail"], "Venue not found");
    }
}

#[tokio::test]
async fn occupancy_counts_seats_across_events() {
    let app = TestApp::spawn().await;
    let venue = app.venue(100).await;
    let first = app.event(venue).await;
    let second = app.event(venue).await;
    let standard = app.ticket_type("Standard", 20.0).await;

    assert_eq!(app.book(first, standard, 5).await.0, StatusCode::CREATED);
    assert_eq!(app.book(second, standard, 10).await.0, StatusCode::CREATED);
    let (_, cancelled) = app.book(second, standard, 7).await;
    let cancelled_id = cancelled["id"].as_i64().unwrap();
    assert_eq!(app.delete(&format!("/bookings/{cancelled_id}")).await.0, StatusCode::OK);

    let (status, occupancy) = app.get(&format!("/venues/{venue}/occupancy")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(occupancy["total_bookings"], 15);
    assert_eq!(occupancy["available_capacity"], 85);
    assert_eq!(occupancy["occupancy_percentage"], 15.0);
    assert_eq!(occupancy["event_count"], 2);

    let (_, events) = app.get(&format!("/venues/{venue}/events")).await;
    assert_eq!(events.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn venue_list_is_paginated() {
    let app = TestApp::spawn().await;
    for _ in 0..3 {
        app.venue(50).await;
    }

    let (_, page) = app.get("/venues?skip=1&limit=1").await;
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"], 2);
}
