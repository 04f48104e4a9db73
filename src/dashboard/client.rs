use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    AvailableTickets, Booking, BookingSearchQuery, BookingStatus, BookingStatusUpdate,
    BookingWithDetails, BusiestVenue, CreateBooking, CreateEvent, CreateTicketType, CreateVenue,
    Event, EventRevenue, EventStatus, EventStatusUpdate, EventWithDetails, MonthlyRevenue,
    PopularEvent, SystemStats, TicketType, TicketTypeAnalysis, TicketTypeStats, Venue,
    VenueOccupancy, VenueWithEvents,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Cannot reach the ticket booking API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Body of `DELETE /bookings/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub message: String,
    pub booking_id: i64,
}

#[derive(Serialize)]
struct TopQuery {
    limit: i64,
}

/// Thin typed wrapper over the booking HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /* ---------- venues ---------- */

    pub async fn venues(&self) -> Result<Vec<VenueWithEvents>, ClientError> {
        self.get("/venues").await
    }

    pub async fn create_venue(&self, venue: &CreateVenue) -> Result<Venue, ClientError> {
        self.send(Method::POST, "/venues", venue).await
    }

    pub async fn venue_occupancy(&self, venue_id: i64) -> Result<VenueOccupancy, ClientError> {
        self.get(&format!("/venues/{venue_id}/occupancy")).await
    }

    /* ---------- events ---------- */

    pub async fn events(&self) -> Result<Vec<EventWithDetails>, ClientError> {
        self.get("/events").await
    }

    pub async fn create_event(&self, event: &CreateEvent) -> Result<Event, ClientError> {
        self.send(Method::POST, "/events", event).await
    }

    pub async fn set_event_status(&self, event_id: i64, status: EventStatus) -> Result<Event, ClientError> {
        self.send(Method::PATCH, &format!("/events/{event_id}/status"), &EventStatusUpdate { status })
            .await
    }

    pub async fn available_tickets(&self, event_id: i64) -> Result<AvailableTickets, ClientError> {
        self.get(&format!("/events/{event_id}/available-tickets")).await
    }

    pub async fn event_revenue(&self, event_id: i64) -> Result<EventRevenue, ClientError> {
        self.get(&format!("/events/{event_id}/revenue")).await
    }

    /* ---------- ticket types ---------- */

    pub async fn ticket_types(&self) -> Result<Vec<TicketType>, ClientError> {
        self.get("/ticket-types").await
    }

    pub async fn create_ticket_type(&self, ticket_type: &CreateTicketType) -> Result<TicketType, ClientError> {
        self.send(Method::POST, "/ticket-types", ticket_type).await
    }

    pub async fn ticket_type_stats(&self, ticket_type_id: i64) -> Result<TicketTypeStats, ClientError> {
        self.get(&format!("/ticket-types/{ticket_type_id}/stats")).await
    }

    /* ---------- bookings ---------- */

    pub async fn bookings(&self) -> Result<Vec<BookingWithDetails>, ClientError> {
        self.get("/bookings").await
    }

    pub async fn search_bookings(
        &self,
        query: &BookingSearchQuery,
    ) -> Result<Vec<BookingWithDetails>, ClientError> {
        self.get_with_query("/bookings/search", query).await
    }

    pub async fn create_booking(&self, booking: &CreateBooking) -> Result<Booking, ClientError> {
        self.send(Method::POST, "/bookings", booking).await
    }

    pub async fn set_booking_status(
        &self,
        booking_id: i64,
        status: BookingStatus,
    ) -> Result<Booking, ClientError> {
        self.send(Method::PATCH, &format!("/bookings/{booking_id}/status"), &BookingStatusUpdate { status })
            .await
    }

    pub async fn cancel_booking(&self, booking_id: i64) -> Result<CancelResponse, ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/bookings/{booking_id}")))
            .send()
            .await?;
        Self::decode(response).await
    }

    /* ---------- stats ---------- */

    pub async fn system_stats(&self) -> Result<SystemStats, ClientError> {
        self.get("/stats").await
    }

    pub async fn popular_events(&self, limit: i64) -> Result<Vec<PopularEvent>, ClientError> {
        self.get_with_query("/stats/popular-events", &TopQuery { limit }).await
    }

    pub async fn busiest_venues(&self, limit: i64) -> Result<Vec<BusiestVenue>, ClientError> {
        self.get_with_query("/stats/busiest-venues", &TopQuery { limit }).await
    }

    pub async fn ticket_type_analysis(&self) -> Result<TicketTypeAnalysis, ClientError> {
        self.get("/stats/ticket-type-analysis").await
    }

    pub async fn revenue_by_month(&self) -> Result<Vec<MonthlyRevenue>, ClientError> {
        self.get("/stats/revenue-by-month").await
    }

    // --- Вспомогательные функции ---

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!("GET {}", path);
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        debug!("GET {}", path);
        let response = self.http.get(self.url(path)).query(query).send().await?;
        Self::decode(response).await
    }

    async fn send<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!("{} {}", method, path);
        let response = self.http.request(method, self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// Success bodies are decoded as `T`; error bodies yield their `detail`.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            detail: error_detail(status, &text),
        })
    }
}

fn error_detail(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("HTTP {} error", status.as_u16()),
    }
}
