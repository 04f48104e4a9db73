use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

use super::{BookingStatus, Pagination, StatusSummary};

const EVENT_COLUMNS: &str = "id, name, description, event_date, venue_id, status, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }

    /// Cancelled and completed events never change status again.
    pub fn is_terminal(&self) -> bool {
        match self {
            EventStatus::Active => false,
            EventStatus::Cancelled | EventStatus::Completed => true,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub venue_id: i64,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub venue_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventStatusUpdate {
    pub status: EventStatus,
}

/// Event joined with its venue and the seats held by non-cancelled bookings.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventWithDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub venue_name: String,
    pub venue_city: String,
    pub venue_capacity: i64,
    pub booking_count: i64,
    pub total_bookings: i64,
    pub available_capacity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableTickets {
    pub event_id: i64,
    pub event_name: String,
    pub venue_capacity: i64,
    pub total_booked: i64,
    pub available_capacity: i64,
    pub is_sold_out: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRevenue {
    pub event_id: i64,
    pub event_name: String,
    /// Confirmed bookings only.
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub confirmed_revenue: f64,
    pub status_breakdown: BTreeMap<BookingStatus, StatusSummary>,
}

const EVENT_DETAILS_SELECT: &str = r#"
    SELECT
        e.id, e.name, e.description, e.event_date, e.venue_id, e.status, e.created_at,
        v.name AS venue_name,
        v.city AS venue_city,
        v.capacity AS venue_capacity,
        COUNT(b.id) AS booking_count,
        COALESCE(SUM(b.quantity), 0) AS total_bookings,
        v.capacity - COALESCE(SUM(b.quantity), 0) AS available_capacity
    FROM events e
    JOIN venues v ON v.id = e.venue_id
    LEFT JOIN bookings b ON b.event_id = e.id AND b.status != 'cancelled'
"#;

impl Event {
    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_venue(pool: &SqlitePool, venue_id: i64) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE venue_id = ? ORDER BY event_date, id"
        ))
        .bind(venue_id)
        .fetch_all(pool)
        .await
    }

    pub async fn insert(pool: &SqlitePool, input: &CreateEvent) -> Result<Event, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (name, description, event_date, venue_id, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.event_date)
        .bind(input.venue_id)
        .bind(EventStatus::Active)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Moves an active event to `status`. Returns `None` when the event is
    /// missing or no longer active at write time.
    pub async fn set_status(
        pool: &SqlitePool,
        id: i64,
        status: EventStatus,
    ) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET status = ? WHERE id = ? AND status = 'active' RETURNING {EVENT_COLUMNS}"
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

impl EventWithDetails {
    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<EventWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, EventWithDetails>(&format!(
            "{EVENT_DETAILS_SELECT} WHERE e.id = ? GROUP BY e.id"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Vec<EventWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, EventWithDetails>(&format!(
            "{EVENT_DETAILS_SELECT} GROUP BY e.id ORDER BY e.id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }
}
