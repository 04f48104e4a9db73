//! Ticket Booking Dashboard
//!
//! Command-line front end for the booking API: browse venues, events and
//! bookings, watch revenue and occupancy, and create or change records.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ticket_booking::dashboard::{render, ApiClient};
use ticket_booking::models::{
    BookingSearchQuery, BookingStatus, CreateBooking, CreateEvent, CreateTicketType, CreateVenue,
    EventStatus, TicketCategory,
};

#[derive(Parser)]
#[command(name = "ticket-dashboard")]
#[command(about = "Manage and monitor the ticket booking system")]
struct Cli {
    /// Base URL of the booking API
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Key metrics, revenue, status distribution and top lists
    Overview {
        /// How many popular events / busiest venues to show
        #[arg(short, long, default_value_t = 5)]
        top: i64,
    },

    /// List venues
    Venues,

    /// List events with their remaining capacity
    Events,

    /// List ticket types with revenue share
    TicketTypes,

    /// List bookings
    Bookings,

    /// Search bookings
    Search {
        /// Matches event, venue, customer name or booking code
        query: Option<String>,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        venue: Option<String>,
        #[arg(long, value_parser = parse_category)]
        ticket_type: Option<TicketCategory>,
        #[arg(long, value_parser = parse_booking_status)]
        status: Option<BookingStatus>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Seats and revenue of one event
    Availability { event_id: i64 },

    /// Seat usage across all events of one venue
    Occupancy { venue_id: i64 },

    /// Sales of one ticket type, split by booking status
    TicketTypeStats { ticket_type_id: i64 },

    /// Create a venue
    CreateVenue {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        capacity: i64,
    },

    /// Schedule an event (date in RFC 3339, e.g. 2027-05-01T19:00:00Z)
    CreateEvent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        date: DateTime<Utc>,
        #[arg(long)]
        venue_id: i64,
        #[arg(long)]
        description: Option<String>,
    },

    /// Create a ticket type (VIP, Standard or Economy)
    CreateTicketType {
        #[arg(long, value_parser = parse_category)]
        name: TicketCategory,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: Option<String>,
    },

    /// Book tickets
    Book {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        event_id: i64,
        #[arg(long)]
        ticket_type_id: i64,
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },

    /// Change a booking status (pending, confirmed, cancelled)
    SetStatus {
        booking_id: i64,
        #[arg(value_parser = parse_booking_status)]
        status: BookingStatus,
    },

    /// Change an event status (active, cancelled, completed)
    SetEventStatus {
        event_id: i64,
        #[arg(value_parser = parse_event_status)]
        status: EventStatus,
    },

    /// Cancel a booking
    Cancel { booking_id: i64 },
}

fn parse_category(value: &str) -> Result<TicketCategory, String> {
    match value.to_ascii_lowercase().as_str() {
        "vip" => Ok(TicketCategory::Vip),
        "standard" => Ok(TicketCategory::Standard),
        "economy" => Ok(TicketCategory::Economy),
        other => Err(format!("unknown ticket type '{other}' (VIP, Standard, Economy)")),
    }
}

fn parse_booking_status(value: &str) -> Result<BookingStatus, String> {
    match value.to_ascii_lowercase().as_str() {
        "pending" => Ok(BookingStatus::Pending),
        "confirmed" => Ok(BookingStatus::Confirmed),
        "cancelled" => Ok(BookingStatus::Cancelled),
        other => Err(format!("unknown booking status '{other}'")),
    }
}

fn parse_event_status(value: &str) -> Result<EventStatus, String> {
    match value.to_ascii_lowercase().as_str() {
        "active" => Ok(EventStatus::Active),
        "cancelled" => Ok(EventStatus::Cancelled),
        "completed" => Ok(EventStatus::Completed),
        other => Err(format!("unknown event status '{other}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url)?;

    let output = match cli.command {
        Commands::Overview { top } => {
            let stats = api.system_stats().await?;
            let popular = api.popular_events(top).await?;
            let busiest = api.busiest_venues(top).await?;
            let monthly = api.revenue_by_month().await?;
            render::overview(&stats, &popular, &busiest, &monthly)
        }

        Commands::Venues => render::venues(&api.venues().await?),

        Commands::Events => render::events(&api.events().await?),

        Commands::TicketTypes => {
            let ticket_types = api.ticket_types().await?;
            let analysis = api.ticket_type_analysis().await?;
            render::ticket_types(&ticket_types, Some(&analysis))
        }

        Commands::Bookings => render::bookings(&api.bookings().await?),

        Commands::Search { query, event, venue, ticket_type, status, email } => {
            let search = BookingSearchQuery {
                q: query,
                event_name: event,
                venue_name: venue,
                ticket_type,
                status,
                customer_email: email,
                ..Default::default()
            };
            render::bookings(&api.search_bookings(&search).await?)
        }

        Commands::Availability { event_id } => {
            let tickets = api.available_tickets(event_id).await?;
            let revenue = api.event_revenue(event_id).await?;
            render::availability(&tickets, &revenue)
        }

        Commands::Occupancy { venue_id } => render::occupancy(&api.venue_occupancy(venue_id).await?),

        Commands::TicketTypeStats { ticket_type_id } => {
            render::ticket_type_stats(&api.ticket_type_stats(ticket_type_id).await?)
        }

        Commands::CreateVenue { name, address, city, capacity } => {
            let venue = api.create_venue(&CreateVenue { name, address, city, capacity }).await?;
            format!("Created venue {} '{}' (capacity {})", venue.id, venue.name, venue.capacity)
        }

        Commands::CreateEvent { name, date, venue_id, description } => {
            let event = api
                .create_event(&CreateEvent { name, description, event_date: date, venue_id })
                .await?;
            format!("Created event {} '{}' on {}", event.id, event.name, event.event_date)
        }

        Commands::CreateTicketType { name, price, description } => {
            let ticket_type = api
                .create_ticket_type(&CreateTicketType { name, price, description })
                .await?;
            format!(
                "Created ticket type {} '{}' at {}",
                ticket_type.id,
                ticket_type.name,
                render::money(ticket_type.price)
            )
        }

        Commands::Book { name, email, event_id, ticket_type_id, quantity } => {
            let booking = api
                .create_booking(&CreateBooking {
                    customer_name: name,
                    customer_email: email,
                    event_id,
                    ticket_type_id,
                    quantity,
                })
                .await?;
            render::booking(&booking)
        }

        Commands::SetStatus { booking_id, status } => {
            render::booking(&api.set_booking_status(booking_id, status).await?)
        }

        Commands::SetEventStatus { event_id, status } => {
            let event = api.set_event_status(event_id, status).await?;
            format!("Event {} '{}' is now {}", event.id, event.name, event.status)
        }

        Commands::Cancel { booking_id } => {
            let response = api.cancel_booking(booking_id).await?;
            format!("{} (booking {})", response.message, response.booking_id)
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}
