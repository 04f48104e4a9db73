//! stats.rs
//!
//! Сводная статистика по всей системе.
//!
//! Все суммы считаются по броням в статусах `pending` и `confirmed`,
//! кроме разбивки по статусам, где отменённые брони видны отдельно.

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppResult;
use crate::middleware::QueryParams;
use crate::models::booking::{breakdown_by_status, StatusRow};
use crate::models::{
    AnalysisSummary, BookingStatus, BusiestVenue, MonthlyRevenue, Overview, PopularEvent,
    RevenueSummary, SystemStats, TicketTypeAnalysis, TicketTypeShare,
};
use crate::services::booking::{percentage, round_money};
use crate::AppState;

const DEFAULT_TOP: i64 = 10;
const MAX_TOP: i64 = 100;

/// Определяет маршруты статистики.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(system_stats))
        .route("/stats/popular-events", get(popular_events))
        .route("/stats/busiest-venues", get(busiest_venues))
        .route("/stats/ticket-type-analysis", get(ticket_type_analysis))
        .route("/stats/revenue-by-month", get(revenue_by_month))
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<i64>,
}

impl TopQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_TOP).clamp(1, MAX_TOP)
    }
}

// --- Общая статистика ---

/// GET /stats
pub async fn system_stats(State(state): State<Arc<AppState>>) -> AppResult<Json<SystemStats>> {
    let pool = &state.db.pool;

    let overview = sqlx::query_as::<_, Overview>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM venues) AS total_venues,
            (SELECT COUNT(*) FROM events) AS total_events,
            (SELECT COUNT(*) FROM bookings) AS total_bookings,
            (SELECT COUNT(*) FROM ticket_types) AS total_ticket_types,
            (SELECT COALESCE(SUM(quantity), 0) FROM bookings WHERE status != 'cancelled')
                AS total_tickets_sold
        "#,
    )
    .fetch_one(pool)
    .await?;

    let breakdown = breakdown_by_status(StatusRow::all(pool).await?);
    let revenue_of = |status: BookingStatus| {
        breakdown.get(&status).map(|s| s.revenue).unwrap_or_default()
    };
    let confirmed = round_money(revenue_of(BookingStatus::Confirmed));
    let revenue = RevenueSummary {
        total_revenue: confirmed,
        pending_revenue: round_money(revenue_of(BookingStatus::Pending)),
        confirmed_revenue: confirmed,
    };

    Ok(Json(SystemStats { overview, revenue, booking_status_breakdown: breakdown }))
}

// --- Рейтинги ---

/// GET /stats/popular-events?limit=10
///
/// События с хотя бы одной активной бронью, по убыванию числа броней.
pub async fn popular_events(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<TopQuery>,
) -> AppResult<Json<Vec<PopularEvent>>> {
    let mut events = sqlx::query_as::<_, PopularEvent>(
        r#"
        SELECT
            e.id AS event_id,
            e.name AS event_name,
            v.name AS venue_name,
            v.city AS venue_city,
            COUNT(b.id) AS booking_count,
            COALESCE(SUM(b.quantity), 0) AS total_tickets,
            CAST(COALESCE(SUM(b.total_price), 0) AS REAL) AS total_revenue
        FROM events e
        JOIN venues v ON v.id = e.venue_id
        JOIN bookings b ON b.event_id = e.id AND b.status != 'cancelled'
        GROUP BY e.id
        ORDER BY booking_count DESC, e.id
        LIMIT ?
        "#,
    )
    .bind(query.limit())
    .fetch_all(&state.db.pool)
    .await?;

    for event in &mut events {
        event.total_revenue = round_money(event.total_revenue);
    }
    Ok(Json(events))
}

/// GET /stats/busiest-venues?limit=10
///
/// Все площадки, включая пустые, по убыванию числа броней.
pub async fn busiest_venues(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<TopQuery>,
) -> AppResult<Json<Vec<BusiestVenue>>> {
    let mut venues = sqlx::query_as::<_, BusiestVenue>(
        r#"
        SELECT
            v.id AS venue_id,
            v.name AS venue_name,
            v.city AS city,
            v.capacity AS capacity,
            COUNT(DISTINCT e.id) AS event_count,
            COUNT(DISTINCT b.id) AS total_bookings,
            COALESCE(SUM(b.quantity), 0) AS total_tickets,
            CAST(COALESCE(SUM(b.total_price), 0) AS REAL) AS total_revenue
        FROM venues v
        LEFT JOIN events e ON e.venue_id = v.id
        LEFT JOIN bookings b ON b.event_id = e.id AND b.status != 'cancelled'
        GROUP BY v.id
        ORDER BY total_bookings DESC, v.id
        LIMIT ?
        "#,
    )
    .bind(query.limit())
    .fetch_all(&state.db.pool)
    .await?;

    for venue in &mut venues {
        venue.total_revenue = round_money(venue.total_revenue);
        venue.occupancy_rate = percentage(venue.total_tickets as f64, venue.capacity as f64);
    }
    Ok(Json(venues))
}

// --- Аналитика по типам билетов ---

/// GET /stats/ticket-type-analysis
pub async fn ticket_type_analysis(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<TicketTypeAnalysis>> {
    let rows = sqlx::query_as::<_, TicketTypeShare>(
        r#"
        SELECT
            t.id AS ticket_type_id,
            t.name AS name,
            t.price AS price,
            COUNT(b.id) AS booking_count,
            COALESCE(SUM(b.quantity), 0) AS tickets_sold,
            CAST(COALESCE(SUM(b.total_price), 0) AS REAL) AS total_revenue
        FROM ticket_types t
        JOIN bookings b ON b.ticket_type_id = t.id AND b.status != 'cancelled'
        GROUP BY t.id
        ORDER BY total_revenue DESC, t.id
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(analyse_ticket_types(rows)))
}

/// Fills in each tier's share of tickets and of revenue.
fn analyse_ticket_types(mut rows: Vec<TicketTypeShare>) -> TicketTypeAnalysis {
    let total_tickets: i64 = rows.iter().map(|r| r.tickets_sold).sum();
    let total_revenue: f64 = rows.iter().map(|r| r.total_revenue).sum();

    for row in &mut rows {
        row.market_share_percentage = percentage(row.tickets_sold as f64, total_tickets as f64);
        row.revenue_share_percentage = percentage(row.total_revenue, total_revenue);
        row.total_revenue = round_money(row.total_revenue);
    }

    TicketTypeAnalysis {
        ticket_types: rows,
        summary: AnalysisSummary {
            total_tickets_sold: total_tickets,
            total_revenue: round_money(total_revenue),
        },
    }
}

// --- Выручка по месяцам ---

/// GET /stats/revenue-by-month
pub async fn revenue_by_month(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<MonthlyRevenue>>> {
    // created_at хранится как RFC 3339, первые 7 символов = YYYY-MM
    let mut months = sqlx::query_as::<_, MonthlyRevenue>(
        r#"
        SELECT
            substr(created_at, 1, 7) AS month,
            COUNT(id) AS booking_count,
            COALESCE(SUM(quantity), 0) AS tickets_sold,
            CAST(COALESCE(SUM(total_price), 0) AS REAL) AS revenue
        FROM bookings
        WHERE status != 'cancelled'
        GROUP BY month
        ORDER BY month
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    for month in &mut months {
        month.revenue = round_money(month.revenue);
    }
    Ok(Json(months))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketCategory;

    fn share(id: i64, name: TicketCategory, tickets_sold: i64, total_revenue: f64) -> TicketTypeShare {
        TicketTypeShare {
            ticket_type_id: id,
            name,
            price: 0.0,
            booking_count: 1,
            tickets_sold,
            total_revenue,
            market_share_percentage: 0.0,
            revenue_share_percentage: 0.0,
        }
    }

    #[test]
    fn shares_add_up_per_tier() {
        let analysis = analyse_ticket_types(vec![
            share(1, TicketCategory::Vip, 1, 300.0),
            share(2, TicketCategory::Economy, 3, 100.0),
        ]);

        assert_eq!(analysis.summary.total_tickets_sold, 4);
        assert_eq!(analysis.summary.total_revenue, 400.0);
        assert_eq!(analysis.ticket_types[0].market_share_percentage, 25.0);
        assert_eq!(analysis.ticket_types[0].revenue_share_percentage, 75.0);
        assert_eq!(analysis.ticket_types[1].market_share_percentage, 75.0);
    }

    #[test]
    fn empty_analysis_has_zero_totals() {
        let analysis = analyse_ticket_types(Vec::new());
        assert!(analysis.ticket_types.is_empty());
        assert_eq!(analysis.summary.total_tickets_sold, 0);
        assert_eq!(analysis.summary.total_revenue, 0.0);
    }

    #[test]
    fn top_limit_is_clamped() {
        assert_eq!(TopQuery { limit: None }.limit(), 10);
        assert_eq!(TopQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(TopQuery { limit: Some(5_000) }.limit(), 100);
    }
}
