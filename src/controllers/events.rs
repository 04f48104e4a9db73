use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::middleware::{IdPath, QueryParams, ValidatedJson};
use crate::models::booking::{breakdown_by_status, StatusRow};
use crate::models::{
    AvailableTickets, Booking, BookingStatus, CreateEvent, Event, EventRevenue, EventStatus,
    EventStatusUpdate, EventWithDetails, Pagination, Venue,
};
use crate::services::booking::round_money;
use crate::services::Availability;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/status", patch(update_event_status))
        .route("/events/{id}/bookings", get(event_bookings))
        .route("/events/{id}/available-tickets", get(available_tickets))
        .route("/events/{id}/revenue", get(event_revenue))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<CreateEvent>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.db.pool;
    Venue::find(pool, input.venue_id)
        .await?
        .ok_or_else(|| AppError::not_found("Venue"))?;

    if input.event_date <= Utc::now() {
        return Err(AppError::BusinessRule("Event date must be in the future".to_string()));
    }

    let event = Event::insert(pool, &input).await?;
    info!("event {} '{}' scheduled at venue {} for {}", event.id, event.name, event.venue_id, event.event_date);
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    QueryParams(page): QueryParams<Pagination>,
) -> AppResult<Json<Vec<EventWithDetails>>> {
    Ok(Json(EventWithDetails::list(&state.db.pool, page).await?))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<EventWithDetails>> {
    EventWithDetails::find(&state.db.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Event"))
}

pub async fn update_event_status(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidatedJson(update): ValidatedJson<EventStatusUpdate>,
) -> AppResult<Json<Event>> {
    let pool = &state.db.pool;
    let event = find_event(&state, id).await?;
    if event.status == update.status {
        return Ok(Json(event));
    }
    if event.status.is_terminal() {
        return Err(terminal_status(event.status));
    }

    match Event::set_status(pool, id, update.status).await? {
        Some(updated) => {
            info!("event {} status {} -> {}", id, event.status, updated.status);
            Ok(Json(updated))
        }
        // Another request closed the event between the read and the write
        None => {
            let current = find_event(&state, id).await?;
            if current.status == update.status {
                Ok(Json(current))
            } else {
                Err(terminal_status(current.status))
            }
        }
    }
}

pub async fn event_bookings(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<Vec<Booking>>> {
    find_event(&state, id).await?;
    Ok(Json(Booking::list_for_event(&state.db.pool, id).await?))
}

pub async fn available_tickets(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<AvailableTickets>> {
    let availability = Availability::load(&state.db.pool, id, None)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    let available_capacity = availability.available();
    Ok(Json(AvailableTickets {
        event_id: availability.event_id,
        event_name: availability.event_name,
        venue_capacity: availability.capacity,
        total_booked: availability.reserved,
        available_capacity,
        is_sold_out: available_capacity == 0,
    }))
}

pub async fn event_revenue(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<EventRevenue>> {
    let event = find_event(&state, id).await?;
    let breakdown = breakdown_by_status(StatusRow::for_event(&state.db.pool, id).await?);

    let revenue_of = |status: BookingStatus| {
        breakdown.get(&status).map(|s| s.revenue).unwrap_or_default()
    };
    let confirmed = round_money(revenue_of(BookingStatus::Confirmed));
    let pending = round_money(revenue_of(BookingStatus::Pending));

    Ok(Json(EventRevenue {
        event_id: event.id,
        event_name: event.name,
        total_revenue: confirmed,
        pending_revenue: pending,
        confirmed_revenue: confirmed,
        status_breakdown: breakdown,
    }))
}

// --- Вспомогательные функции ---

async fn find_event(state: &AppState, id: i64) -> AppResult<Event> {
    Event::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))
}

fn terminal_status(status: EventStatus) -> AppError {
    AppError::BusinessRule(format!("Event is already {}, its status cannot change", status))
}
