use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

use super::{BookingStatus, Pagination, StatusSummary};

const TICKET_TYPE_COLUMNS: &str = "id, name, price, description, created_at";

/// Pricing tier. Each tier exists at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
pub enum TicketCategory {
    #[serde(rename = "VIP")]
    #[sqlx(rename = "VIP")]
    Vip,
    Standard,
    Economy,
}

impl TicketCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::Vip => "VIP",
            TicketCategory::Standard => "Standard",
            TicketCategory::Economy => "Economy",
        }
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TicketType {
    pub id: i64,
    pub name: TicketCategory,
    pub price: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTicketType {
    pub name: TicketCategory,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than 0"))]
    pub price: f64,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTypeStats {
    pub ticket_type_id: i64,
    pub ticket_type_name: TicketCategory,
    pub price: f64,
    pub total_bookings: i64,
    pub total_tickets_sold: i64,
    pub total_revenue: f64,
    pub status_breakdown: BTreeMap<BookingStatus, StatusSummary>,
}

impl TicketType {
    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<TicketType>, sqlx::Error> {
        sqlx::query_as::<_, TicketType>(&format!(
            "SELECT {TICKET_TYPE_COLUMNS} FROM ticket_types WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Vec<TicketType>, sqlx::Error> {
        sqlx::query_as::<_, TicketType>(&format!(
            "SELECT {TICKET_TYPE_COLUMNS} FROM ticket_types ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    /// Whether another ticket type (other than `except_id`) already uses `name`.
    pub async fn category_taken(
        pool: &SqlitePool,
        name: TicketCategory,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM ticket_types WHERE name = ? AND id != COALESCE(?, -1))",
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(pool)
        .await
    }

    pub async fn insert(pool: &SqlitePool, input: &CreateTicketType, price: f64) -> Result<TicketType, sqlx::Error> {
        sqlx::query_as::<_, TicketType>(&format!(
            "INSERT INTO ticket_types (name, price, description, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING {TICKET_TYPE_COLUMNS}"
        ))
        .bind(input.name)
        .bind(price)
        .bind(&input.description)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        input: &CreateTicketType,
        price: f64,
    ) -> Result<Option<TicketType>, sqlx::Error> {
        sqlx::query_as::<_, TicketType>(&format!(
            "UPDATE ticket_types SET name = ?, price = ?, description = ?
             WHERE id = ?
             RETURNING {TICKET_TYPE_COLUMNS}"
        ))
        .bind(input.name)
        .bind(price)
        .bind(&input.description)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
