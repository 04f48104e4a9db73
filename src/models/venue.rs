use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

use super::{Event, Pagination};

const VENUE_COLUMNS: &str = "id, name, address, city, capacity, created_at";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub capacity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateVenue {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(range(min = 1, message = "Capacity must be greater than 0"))]
    pub capacity: i64,
}

/// Venue together with every event it hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueWithEvents {
    #[serde(flatten)]
    pub venue: Venue,
    pub events: Vec<Event>,
    pub event_count: i64,
}

impl VenueWithEvents {
    pub fn new(venue: Venue, events: Vec<Event>) -> Self {
        let event_count = events.len() as i64;
        Self { venue, events, event_count }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueOccupancy {
    pub venue_id: i64,
    pub venue_name: String,
    pub capacity: i64,
    pub total_bookings: i64,
    pub available_capacity: i64,
    pub occupancy_percentage: f64,
    pub event_count: i64,
}

impl Venue {
    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Venue>, sqlx::Error> {
        sqlx::query_as::<_, Venue>(&format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Vec<Venue>, sqlx::Error> {
        sqlx::query_as::<_, Venue>(&format!(
            "SELECT {VENUE_COLUMNS} FROM venues ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn name_taken(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM venues WHERE name = ?)")
            .bind(name)
            .fetch_one(pool)
            .await
    }

    pub async fn insert(pool: &SqlitePool, input: &CreateVenue) -> Result<Venue, sqlx::Error> {
        sqlx::query_as::<_, Venue>(&format!(
            "INSERT INTO venues (name, address, city, capacity, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {VENUE_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.city)
        .bind(input.capacity)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }
}
