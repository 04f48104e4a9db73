mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use common::TestApp;

/// Two venues, two events, VIP and Economy tiers, one booking in each status.
async fn seeded() -> (TestApp, i64, i64) {
    let app = TestApp::spawn().await;
    let big = app.venue(100).await;
    let small = app.venue(10).await;
    let concert = app.event(big).await;
    let play = app.event(small).await;
    let vip = app.ticket_type("VIP", 100.0).await;
    let economy = app.ticket_type("Economy", 20.0).await;

    let (_, confirmed) = app.book(concert, vip, 2).await;
    let confirmed_id = confirmed["id"].as_i64().unwrap();
    app.patch(&format!("/bookings/{confirmed_id}/status"), json!({ "status": "confirmed" }))
        .await;

    app.book(concert, economy, 5).await;
    app.book(play, economy, 4).await;

    let (_, cancelled) = app.book(play, vip, 1).await;
    let cancelled_id = cancelled["id"].as_i64().unwrap();
    app.delete(&format!("/bookings/{cancelled_id}")).await;

    (app, concert, small)
}

#[tokio::test]
async fn system_stats_summarise_everything() {
    let (app, _, _) = seeded().await;

    let (status, stats) = app.get("/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["overview"]["total_venues"], 2);
    assert_eq!(stats["overview"]["total_events"], 2);
    assert_eq!(stats["overview"]["total_ticket_types"], 2);
    assert_eq!(stats["overview"]["total_bookings"], 4);
    assert_eq!(stats["overview"]["total_tickets_sold"], 11);

    assert_eq!(stats["revenue"]["total_revenue"], 200.0);
    assert_eq!(stats["revenue"]["confirmed_revenue"], 200.0);
    assert_eq!(stats["revenue"]["pending_revenue"], 180.0);

    let breakdown = &stats["booking_status_breakdown"];
    assert_eq!(breakdown["pending"]["booking_count"], 2);
    assert_eq!(breakdown["confirmed"]["booking_count"], 1);
    assert_eq!(breakdown["cancelled"]["revenue"], 100.0);
}

#[tokio::test]
async fn popular_events_rank_by_booking_count() {
    let (app, concert, _) = seeded().await;

    let (status, events) = app.get("/stats/popular-events?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_id"], concert);
    assert_eq!(events[0]["booking_count"], 2);
    assert_eq!(events[0]["total_tickets"], 7);
    assert_eq!(events[0]["total_revenue"], 300.0);
}

#[tokio::test]
async fn busiest_venues_report_occupancy() {
    let (app, _, small) = seeded().await;

    let (_, venues) = app.get("/stats/busiest-venues").await;
    let venues = venues.as_array().unwrap();
    assert_eq!(venues.len(), 2);

    let small = venues.iter().find(|v| v["venue_id"] == small).unwrap();
    assert_eq!(small["total_bookings"], 1);
    assert_eq!(small["total_tickets"], 4);
    assert_eq!(small["occupancy_rate"], 40.0);
}

#[tokio::test]
async fn ticket_type_analysis_shares() {
    let (app, _, _) = seeded().await;

    let (_, analysis) = app.get("/stats/ticket-type-analysis").await;
    assert_eq!(analysis["summary"]["total_tickets_sold"], 11);
    assert_eq!(analysis["summary"]["total_revenue"], 380.0);

    let tiers = analysis["ticket_types"].as_array().unwrap();
    assert_eq!(tiers[0]["name"], "VIP");
    assert_eq!(tiers[0]["tickets_sold"], 2);
    assert_eq!(tiers[0]["market_share_percentage"], 18.18);
    assert_eq!(tiers[0]["revenue_share_percentage"], 52.63);
    assert_eq!(tiers[1]["name"], "Economy");
    assert_eq!(tiers[1]["tickets_sold"], 9);
}

#[tokio::test]
async fn revenue_is_bucketed_by_month() {
    let (app, _, _) = seeded().await;

    let (_, months) = app.get("/stats/revenue-by-month").await;
    let months = months.as_array().unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(months[0]["month"], Utc::now().format("%Y-%m").to_string());
    assert_eq!(months[0]["booking_count"], 3);
    assert_eq!(months[0]["tickets_sold"], 11);
    assert_eq!(months[0]["revenue"], 380.0);
}

#[tokio::test]
async fn empty_database_has_zeroed_stats() {
    let app = TestApp::spawn().await;

    let (_, stats) = app.get("/stats").await;
    assert_eq!(stats["overview"]["total_bookings"], 0);
    assert_eq!(stats["revenue"]["total_revenue"], 0.0);
    assert_eq!(stats["booking_status_breakdown"], json!({}));

    let (_, analysis) = app.get("/stats/ticket-type-analysis").await;
    assert_eq!(analysis["ticket_types"], json!([]));
    assert_eq!(app.get("/stats/revenue-by-month").await.1, json!([]));
}
