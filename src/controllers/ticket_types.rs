use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::{IdPath, QueryParams, ValidatedJson};
use crate::models::booking::{breakdown_by_status, StatusRow};
use crate::models::{
    Booking, CreateTicketType, Pagination, TicketCategory, TicketType, TicketTypeStats,
};
use crate::services::booking::round_money;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ticket-types", get(list_ticket_types).post(create_ticket_type))
        .route("/ticket-types/{id}", get(get_ticket_type).put(update_ticket_type))
        .route("/ticket-types/{id}/bookings", get(ticket_type_bookings))
        .route("/ticket-types/{id}/stats", get(ticket_type_stats))
}

pub async fn create_ticket_type(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<CreateTicketType>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.db.pool;
    if TicketType::category_taken(pool, input.name, None).await? {
        return Err(duplicate_category(input.name));
    }

    let ticket_type = TicketType::insert(pool, &input, round_money(input.price))
        .await
        .map_err(|e| unique_to_conflict(e, input.name))?;

    info!("ticket type {} '{}' created at {:.2}", ticket_type.id, ticket_type.name, ticket_type.price);
    Ok((StatusCode::CREATED, Json(ticket_type)))
}

pub async fn list_ticket_types(
    State(state): State<Arc<AppState>>,
    QueryParams(page): QueryParams<Pagination>,
) -> AppResult<Json<Vec<TicketType>>> {
    Ok(Json(TicketType::list(&state.db.pool, page).await?))
}

pub async fn get_ticket_type(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<TicketType>> {
    Ok(Json(find_ticket_type(&state, id).await?))
}

pub async fn update_ticket_type(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<CreateTicketType>,
) -> AppResult<Json<TicketType>> {
    let pool = &state.db.pool;
    find_ticket_type(&state, id).await?;

    if TicketType::category_taken(pool, input.name, Some(id)).await? {
        return Err(duplicate_category(input.name));
    }

    let updated = TicketType::update(pool, id, &input, round_money(input.price))
        .await
        .map_err(|e| unique_to_conflict(e, input.name))?
        .ok_or_else(|| AppError::not_found("Ticket type"))?;

    info!("ticket type {} updated: '{}' at {:.2}", id, updated.name, updated.price);
    Ok(Json(updated))
}

pub async fn ticket_type_bookings(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<Vec<Booking>>> {
    find_ticket_type(&state, id).await?;
    Ok(Json(Booking::list_for_ticket_type(&state.db.pool, id).await?))
}

pub async fn ticket_type_stats(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> AppResult<Json<TicketTypeStats>> {
    let ticket_type = find_ticket_type(&state, id).await?;
    let breakdown = breakdown_by_status(StatusRow::for_ticket_type(&state.db.pool, id).await?);

    // Итоги только по броням, которые держат места
    let held = breakdown.iter().filter(|(status, _)| status.holds_seats());
    let (total_bookings, total_tickets_sold, total_revenue) = held.fold(
        (0, 0, 0.0),
        |(bookings, tickets, revenue), (_, s)| {
            (bookings + s.booking_count, tickets + s.tickets_sold, revenue + s.revenue)
        },
    );

    Ok(Json(TicketTypeStats {
        ticket_type_id: ticket_type.id,
        ticket_type_name: ticket_type.name,
        price: ticket_type.price,
        total_bookings,
        total_tickets_sold,
        total_revenue: round_money(total_revenue),
        status_breakdown: breakdown,
    }))
}

// --- Вспомогательные функции ---

async fn find_ticket_type(state: &AppState, id: i64) -> AppResult<TicketType> {
    TicketType::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Ticket type"))
}

fn duplicate_category(name: TicketCategory) -> AppError {
    AppError::Conflict(format!("Ticket type '{}' already exists", name))
}

fn unique_to_conflict(e: sqlx::Error, name: TicketCategory) -> AppError {
    if is_unique_violation(&e) {
        duplicate_category(name)
    } else {
        e.into()
    }
}
