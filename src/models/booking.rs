use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

use super::{Pagination, TicketCategory};

pub(crate) const BOOKING_COLUMNS: &str = "id, booking_code, customer_name, customer_email, event_id, \
     ticket_type_id, quantity, total_price, status, created_at";

/// Booking joined with the names a human needs to recognise it.
pub(crate) const BOOKING_DETAILS_SELECT: &str = r#"
    SELECT
        b.id, b.booking_code, b.customer_name, b.customer_email, b.event_id,
        b.ticket_type_id, b.quantity, b.total_price, b.status, b.created_at,
        e.name AS event_name,
        e.event_date AS event_date,
        v.name AS venue_name,
        v.city AS venue_city,
        t.name AS ticket_type_name,
        t.price AS ticket_type_price
    FROM bookings b
    JOIN events e ON e.id = b.event_id
    JOIN venues v ON v.id = e.venue_id
    JOIN ticket_types t ON t.id = b.ticket_type_id
"#;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and confirmed bookings hold seats; cancelled ones do not.
    pub fn holds_seats(&self) -> bool {
        match self {
            BookingStatus::Pending | BookingStatus::Confirmed => true,
            BookingStatus::Cancelled => false,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub booking_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub event_id: i64,
    pub ticket_type_id: i64,
    pub quantity: i64,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBooking {
    #[validate(length(min = 1, max = 100))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(range(min = 1))]
    pub event_id: i64,
    #[validate(range(min = 1))]
    pub ticket_type_id: i64,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 10, message = "Quantity must be between 1 and 10"))]
    pub quantity: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BookingWithDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub event_name: String,
    pub event_date: DateTime<Utc>,
    pub venue_name: String,
    pub venue_city: String,
    pub ticket_type_name: TicketCategory,
    pub ticket_type_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

/// Filters for `GET /bookings/search`. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingSearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<TicketCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl BookingSearchQuery {
    pub fn page(&self) -> Pagination {
        Pagination { skip: self.skip, limit: self.limit }
    }
}

/// Per-status totals used by revenue and statistics endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub booking_count: i64,
    pub tickets_sold: i64,
    pub revenue: f64,
}

#[derive(Debug, FromRow)]
pub(crate) struct StatusRow {
    pub status: BookingStatus,
    pub booking_count: i64,
    pub tickets_sold: i64,
    pub revenue: f64,
}

const STATUS_ROWS_SELECT: &str = r#"
    SELECT
        status,
        COUNT(id) AS booking_count,
        COALESCE(SUM(quantity), 0) AS tickets_sold,
        CAST(COALESCE(SUM(total_price), 0) AS REAL) AS revenue
    FROM bookings
"#;

impl StatusRow {
    pub(crate) async fn all(pool: &SqlitePool) -> Result<Vec<StatusRow>, sqlx::Error> {
        sqlx::query_as::<_, StatusRow>(&format!("{STATUS_ROWS_SELECT} GROUP BY status"))
            .fetch_all(pool)
            .await
    }

    pub(crate) async fn for_event(pool: &SqlitePool, event_id: i64) -> Result<Vec<StatusRow>, sqlx::Error> {
        sqlx::query_as::<_, StatusRow>(&format!(
            "{STATUS_ROWS_SELECT} WHERE event_id = ? GROUP BY status"
        ))
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    pub(crate) async fn for_ticket_type(
        pool: &SqlitePool,
        ticket_type_id: i64,
    ) -> Result<Vec<StatusRow>, sqlx::Error> {
        sqlx::query_as::<_, StatusRow>(&format!(
            "{STATUS_ROWS_SELECT} WHERE ticket_type_id = ? GROUP BY status"
        ))
        .bind(ticket_type_id)
        .fetch_all(pool)
        .await
    }
}

pub(crate) fn breakdown_by_status(rows: Vec<StatusRow>) -> BTreeMap<BookingStatus, StatusSummary> {
    rows.into_iter()
        .map(|row| {
            (
                row.status,
                StatusSummary {
                    booking_count: row.booking_count,
                    tickets_sold: row.tickets_sold,
                    revenue: crate::services::booking::round_money(row.revenue),
                },
            )
        })
        .collect()
}

impl Booking {
    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_event(pool: &SqlitePool, event_id: i64) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE event_id = ? ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_ticket_type(
        pool: &SqlitePool,
        ticket_type_id: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE ticket_type_id = ? ORDER BY id"
        ))
        .bind(ticket_type_id)
        .fetch_all(pool)
        .await
    }

    pub async fn code_exists(pool: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM bookings WHERE booking_code = ?)")
            .bind(code)
            .fetch_one(pool)
            .await
    }

    /// Logical delete. Returns `false` when no such booking exists.
    pub async fn cancel(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query("UPDATE bookings SET status = 'cancelled' WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map(|r| r.rows_affected() > 0)
    }
}

impl BookingWithDetails {
    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<BookingWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, BookingWithDetails>(&format!("{BOOKING_DETAILS_SELECT} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Vec<BookingWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, BookingWithDetails>(&format!(
            "{BOOKING_DETAILS_SELECT} ORDER BY b.id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cancelled_bookings_release_seats() {
        assert!(BookingStatus::Pending.holds_seats());
        assert!(BookingStatus::Confirmed.holds_seats());
        assert!(!BookingStatus::Cancelled.holds_seats());
    }

    #[test]
    fn quantity_defaults_to_one_and_is_bounded() {
        let booking: CreateBooking = serde_json::from_value(serde_json::json!({
            "customer_name": "Ada",
            "customer_email": "ada@example.com",
            "event_id": 1,
            "ticket_type_id": 1
        }))
        .unwrap();
        assert_eq!(booking.quantity, 1);
        assert!(booking.validate().is_ok());

        let too_many = CreateBooking { quantity: 11, ..booking.clone() };
        assert!(too_many.validate().is_err());

        let bad_email = CreateBooking { customer_email: "not-an-email".into(), ..booking };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn search_query_parses_from_query_string() {
        let query: BookingSearchQuery =
            serde_urlencoded::from_str("q=rock&ticket_type=VIP&status=confirmed&limit=5").unwrap();
        assert_eq!(query.q.as_deref(), Some("rock"));
        assert_eq!(query.ticket_type, Some(TicketCategory::Vip));
        assert_eq!(query.status, Some(BookingStatus::Confirmed));
        assert_eq!(query.page().limit(), 5);
        assert_eq!(query.page().offset(), 0);

        let encoded = serde_urlencoded::to_string(&BookingSearchQuery {
            status: Some(BookingStatus::Pending),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(encoded, "status=pending");
    }

    #[test]
    fn status_breakdown_keys_serialize_lowercase() {
        let rows = vec![StatusRow {
            status: BookingStatus::Confirmed,
            booking_count: 2,
            tickets_sold: 5,
            revenue: 250.004,
        }];
        let json = serde_json::to_value(breakdown_by_status(rows)).unwrap();
        assert_eq!(json["confirmed"]["tickets_sold"], 5);
        assert_eq!(json["confirmed"]["revenue"], 250.0);
    }
}
