use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::info;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::{IdPath, QueryParams, ValidatedJson};
use crate::models::{CreateVenue, Event, Pagination, Venue, VenueOccupancy, VenueWithEvents};
use crate::services::booking::percentage;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venues", get(list_venues).post(create_venue))
        .route("/venues/{id}", get(get_venue))
        .route("/venues/{id}/events", get(venue_events))
        .route("/venues/{id}/occupancy", get(venue_occupancy))
}

pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<CreateVenue>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.db.pool;
    if Venue::name_taken(pool, &input.name).await? {
        return Err(duplicate_name(&input.name));
    }

    let venue = Venue::insert(pool, &input).await.map_err(|e| {
        if is_unique_violation(&e) {
            duplicate_name(&input.name)
        } else {
            e.into()
        }
    })?;

    info!("venue {} '{}' created, capacity {}", venue.id, venue.name, venue.capacity);
    Ok((StatusCode::CREATED, Json(venue)))
}

pub async fn list_venues(
    State(state): State<Arc<AppState>>,
    QueryParams(page): QueryParams<Pagination>,
) -> AppResult<Json<Vec<VenueWithEvents>>> {
    let pool = &state.db.pool;
    let venues = Venue::list(pool, page).await?;

    let result = try_join_all(venues.into_iter().map(|venue| async move {
        let events = Event::list_for_venue(pool, venue.id).await?;
        Ok::<_, sqlx::Error>(VenueWithEvents::new(venue, events))
    }))
    .await?;
    Ok(Json(result))
}

pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<VenueWithEvents>> {
    let venue = find_venue(&state, id).await?;
    let events = Event::list_for_venue(&state.db.pool, id).await?;
    Ok(Json(VenueWithEvents::new(venue, events)))
}

pub async fn venue_events(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<Vec<Event>>> {
    find_venue(&state, id).await?;
    Ok(Json(Event::list_for_venue(&state.db.pool, id).await?))
}

pub async fn venue_occupancy(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<VenueOccupancy>> {
    let venue = find_venue(&state, id).await?;

    // Места по всем событиям площадки, кроме отменённых броней
    let (total_bookings, event_count): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COALESCE(SUM(b.quantity), 0)
             FROM bookings b
             JOIN events e ON e.id = b.event_id
             WHERE e.venue_id = ? AND b.status != 'cancelled'),
            (SELECT COUNT(*) FROM events WHERE venue_id = ?)
        "#,
    )
    .bind(id)
    .bind(id)
    .fetch_one(&state.db.pool)
    .await?;

    Ok(Json(VenueOccupancy {
        venue_id: venue.id,
        venue_name: venue.name,
        capacity: venue.capacity,
        total_bookings,
        available_capacity: venue.capacity - total_bookings,
        occupancy_percentage: percentage(total_bookings as f64, venue.capacity as f64),
        event_count,
    }))
}

// --- Вспомогательные функции ---

async fn find_venue(state: &AppState, id: i64) -> AppResult<Venue> {
    Venue::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Venue"))
}

fn duplicate_name(name: &str) -> AppError {
    AppError::Conflict(format!("Venue with name '{}' already exists", name))
}
