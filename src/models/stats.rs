use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

use super::{BookingStatus, StatusSummary, TicketCategory};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub overview: Overview,
    pub revenue: RevenueSummary,
    pub booking_status_breakdown: BTreeMap<BookingStatus, StatusSummary>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Overview {
    pub total_venues: i64,
    pub total_events: i64,
    pub total_bookings: i64,
    pub total_ticket_types: i64,
    /// Seats held by pending and confirmed bookings.
    pub total_tickets_sold: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub confirmed_revenue: f64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PopularEvent {
    pub event_id: i64,
    pub event_name: String,
    pub venue_name: String,
    pub venue_city: String,
    pub booking_count: i64,
    pub total_tickets: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BusiestVenue {
    pub venue_id: i64,
    pub venue_name: String,
    pub city: String,
    pub capacity: i64,
    pub event_count: i64,
    pub total_bookings: i64,
    pub total_tickets: i64,
    pub total_revenue: f64,
    #[sqlx(default)]
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTypeAnalysis {
    pub ticket_types: Vec<TicketTypeShare>,
    pub summary: AnalysisSummary,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketTypeShare {
    pub ticket_type_id: i64,
    pub name: TicketCategory,
    pub price: f64,
    pub booking_count: i64,
    pub tickets_sold: i64,
    pub total_revenue: f64,
    #[sqlx(default)]
    pub market_share_percentage: f64,
    #[sqlx(default)]
    pub revenue_share_percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_tickets_sold: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub booking_count: i64,
    pub tickets_sold: i64,
    pub revenue: f64,
}
