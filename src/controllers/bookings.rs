use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::middleware::{IdPath, QueryParams, ValidatedJson};
use crate::models::{
    Booking, BookingSearchQuery, BookingStatusUpdate, BookingWithDetails, CreateBooking, Pagination,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/search", get(search_bookings))
        .route(
            "/bookings/{id}",
            get(get_booking).put(update_booking).delete(cancel_booking),
        )
        .route("/bookings/{id}/status", patch(update_booking_status))
}

/* ---------- BOOKINGS ---------- */

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<CreateBooking>,
) -> AppResult<impl IntoResponse> {
    let booking = state.bookings.create(&input).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    QueryParams(page): QueryParams<Pagination>,
) -> AppResult<Json<Vec<BookingWithDetails>>> {
    Ok(Json(BookingWithDetails::list(&state.db.pool, page).await?))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<BookingWithDetails>> {
    BookingWithDetails::find(&state.db.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Booking"))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<CreateBooking>,
) -> AppResult<Json<Booking>> {
    Ok(Json(state.bookings.update(id, &input).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<impl IntoResponse> {
    state.bookings.cancel(id).await?;
    Ok(Json(json!({
        "message": "Booking cancelled successfully",
        "booking_id": id,
    })))
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidatedJson(update): ValidatedJson<BookingStatusUpdate>,
) -> AppResult<Json<Booking>> {
    Ok(Json(state.bookings.set_status(id, update.status).await?))
}

/* ---------- SEARCH ---------- */

pub async fn search_bookings(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<BookingSearchQuery>,
) -> AppResult<Json<Vec<BookingWithDetails>>> {
    let results = state.search_client.search_bookings(&query).await?;
    tracing::debug!("booking search matched {} rows", results.len());
    Ok(Json(results))
}
