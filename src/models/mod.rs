pub mod venue;
pub mod event;
pub mod ticket_type;
pub mod booking;
pub mod stats;

pub use venue::{CreateVenue, Venue, VenueOccupancy, VenueWithEvents};
pub use event::{
    AvailableTickets, CreateEvent, Event, EventRevenue, EventStatus, EventStatusUpdate,
    EventWithDetails,
};
pub use ticket_type::{CreateTicketType, TicketCategory, TicketType, TicketTypeStats};
pub use booking::{
    Booking, BookingSearchQuery, BookingStatus, BookingStatusUpdate, BookingWithDetails,
    CreateBooking, StatusSummary,
};
pub use stats::{
    AnalysisSummary, BusiestVenue, MonthlyRevenue, Overview, PopularEvent, RevenueSummary,
    SystemStats, TicketTypeAnalysis, TicketTypeShare,
};

use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

/// `?skip=&limit=` accepted by every list endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}
