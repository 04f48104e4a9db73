//! booking.rs
//!
//! Capacity, pricing and booking-code rules, and the guarded writes that
//! enforce them.
//!
//! Seat accounting: a booking holds `quantity` seats of its event's venue
//! while it is `pending` or `confirmed`. Every write that can add held seats
//! (new booking, edited booking, re-activated booking) is a single SQL
//! statement whose WHERE clause re-checks the event status and the remaining
//! capacity, so two concurrent requests can never both take the last seats.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::booking::BOOKING_COLUMNS;
use crate::models::{Booking, BookingStatus, CreateBooking, Event, EventStatus, TicketType};

/// How many fresh codes to try before giving up on a booking.
pub const MAX_CODE_ATTEMPTS: usize = 10;

/// Sentinel for "exclude no booking" in the seat guard; real ids start at 1.
const NO_BOOKING: i64 = 0;

/// Binds, in order: event id, booking id to exclude, seats requested.
const SEAT_GUARD: &str = r#"
    EXISTS (
        SELECT 1
        FROM events e
        JOIN venues v ON v.id = e.venue_id
        WHERE e.id = ?
          AND e.status = 'active'
          AND (
              SELECT COALESCE(SUM(b.quantity), 0)
              FROM bookings b
              WHERE b.event_id = e.id AND b.status != 'cancelled' AND b.id != ?
          ) + ? <= v.capacity
    )
"#;

/// Why a booking request cannot be accepted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingRejection {
    #[error("Event not found")]
    EventNotFound,

    #[error("Event is {0}, cannot book tickets")]
    EventNotActive(EventStatus),

    #[error("Cannot book tickets for past events")]
    EventInPast,

    #[error("Ticket type not found")]
    TicketTypeNotFound,

    #[error("Not enough capacity. Available: {available}, Requested: {requested}")]
    CapacityExceeded { available: i64, requested: i64 },
}

pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn total_price(unit_price: f64, quantity: i64) -> f64 {
    round_money(unit_price * quantity as f64)
}

/// Percentage of `part` in `whole`, two decimals, 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round_money(part / whole * 100.0)
    } else {
        0.0
    }
}

/// Seats left after granting `requested` on top of `reserved`.
pub fn check_capacity(capacity: i64, reserved: i64, requested: i64) -> Result<i64, BookingRejection> {
    let available = (capacity - reserved).max(0);
    if requested > available {
        return Err(BookingRejection::CapacityExceeded { available, requested });
    }
    Ok(available - requested)
}

pub fn check_event_bookable(event: &Event, now: DateTime<Utc>) -> Result<(), BookingRejection> {
    match event.status {
        EventStatus::Active => {}
        status @ (EventStatus::Cancelled | EventStatus::Completed) => {
            return Err(BookingRejection::EventNotActive(status));
        }
    }
    if event.event_date <= now {
        return Err(BookingRejection::EventInPast);
    }
    Ok(())
}

/// `BK-YYYYMMDD-XXXXXX`: creation date plus six random hex digits.
pub fn generate_booking_code(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("BK-{}-{}", now.format("%Y%m%d"), random[..6].to_uppercase())
}

/// Seat usage of one event at read time.
#[derive(Debug, Clone, FromRow)]
pub struct Availability {
    pub event_id: i64,
    pub event_name: String,
    pub status: EventStatus,
    pub capacity: i64,
    pub reserved: i64,
}

impl Availability {
    pub fn available(&self) -> i64 {
        (self.capacity - self.reserved).max(0)
    }

    /// Seats held on `event_id`, ignoring the booking `exclude` if given.
    pub async fn load(
        pool: &SqlitePool,
        event_id: i64,
        exclude: Option<i64>,
    ) -> Result<Option<Availability>, sqlx::Error> {
        sqlx::query_as::<_, Availability>(
            r#"
            SELECT
                e.id AS event_id,
                e.name AS event_name,
                e.status AS status,
                v.capacity AS capacity,
                (
                    SELECT COALESCE(SUM(b.quantity), 0)
                    FROM bookings b
                    WHERE b.event_id = e.id AND b.status != 'cancelled' AND b.id != ?
                ) AS reserved
            FROM events e
            JOIN venues v ON v.id = e.venue_id
            WHERE e.id = ?
            "#,
        )
        .bind(exclude.unwrap_or(NO_BOOKING))
        .bind(event_id)
        .fetch_optional(pool)
        .await
    }
}

/// Accepted price and the seats that would remain afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub total_price: f64,
    pub remaining: i64,
}

#[derive(Clone)]
pub struct BookingService {
    pool: SqlitePool,
}

impl BookingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Runs every booking rule against current data without writing anything.
    /// `exclude` leaves one existing booking's seats out of the count.
    pub async fn quote(&self, input: &CreateBooking, exclude: Option<i64>) -> AppResult<Quote> {
        let event = Event::find(&self.pool, input.event_id)
            .await?
            .ok_or(BookingRejection::EventNotFound)?;
        check_event_bookable(&event, Utc::now())?;

        let ticket_type = TicketType::find(&self.pool, input.ticket_type_id)
            .await?
            .ok_or(BookingRejection::TicketTypeNotFound)?;

        let availability = Availability::load(&self.pool, event.id, exclude)
            .await?
            .ok_or(BookingRejection::EventNotFound)?;
        let remaining = check_capacity(availability.capacity, availability.reserved, input.quantity)?;

        Ok(Quote {
            total_price: total_price(ticket_type.price, input.quantity),
            remaining,
        })
    }

    pub async fn create(&self, input: &CreateBooking) -> AppResult<Booking> {
        let quote = self.quote(input, None).await?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_booking_code(Utc::now());
            if Booking::code_exists(&self.pool, &code).await? {
                warn!("booking code {} already taken (attempt {})", code, attempt);
                continue;
            }

            let inserted = sqlx::query_as::<_, Booking>(&format!(
                r#"
                INSERT INTO bookings (
                    booking_code, customer_name, customer_email, event_id,
                    ticket_type_id, quantity, total_price, status, created_at
                )
                SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?
                WHERE {SEAT_GUARD}
                RETURNING {BOOKING_COLUMNS}
                "#
            ))
            .bind(&code)
            .bind(&input.customer_name)
            .bind(&input.customer_email)
            .bind(input.event_id)
            .bind(input.ticket_type_id)
            .bind(input.quantity)
            .bind(quote.total_price)
            .bind(BookingStatus::Pending)
            .bind(Utc::now())
            .bind(input.event_id)
            .bind(NO_BOOKING)
            .bind(input.quantity)
            .fetch_optional(&self.pool)
            .await;

            match inserted {
                Ok(Some(booking)) => {
                    info!(
                        "booking {} created: event {} x{} = {:.2}, {} seats left",
                        booking.booking_code,
                        booking.event_id,
                        booking.quantity,
                        booking.total_price,
                        quote.remaining
                    );
                    return Ok(booking);
                }
                Ok(None) => {
                    return Err(self.guard_failure(input.event_id, None, input.quantity).await);
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!("booking code {} collided on insert (attempt {})", code, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict("Could not generate a unique booking code".to_string()))
    }

    /// Replaces every editable field and re-prices the booking.
    pub async fn update(&self, id: i64, input: &CreateBooking) -> AppResult<Booking> {
        let existing = Booking::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking"))?;
        if !existing.status.holds_seats() {
            return Err(AppError::BusinessRule(
                "Cancelled bookings cannot be modified".to_string(),
            ));
        }

        let quote = self.quote(input, Some(id)).await?;

        let updated = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET customer_name = ?, customer_email = ?, event_id = ?,
                ticket_type_id = ?, quantity = ?, total_price = ?
            WHERE id = ? AND {SEAT_GUARD}
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(&input.customer_name)
        .bind(&input.customer_email)
        .bind(input.event_id)
        .bind(input.ticket_type_id)
        .bind(input.quantity)
        .bind(quote.total_price)
        .bind(id)
        .bind(input.event_id)
        .bind(id)
        .bind(input.quantity)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(booking) => Ok(booking),
            None => Err(self.guard_failure(input.event_id, Some(id), input.quantity).await),
        }
    }

    /// Moving a cancelled booking back to pending/confirmed takes its seats
    /// again, so that transition goes through the seat guard.
    pub async fn set_status(&self, id: i64, status: BookingStatus) -> AppResult<Booking> {
        let existing = Booking::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking"))?;
        if existing.status == status {
            return Ok(existing);
        }

        let reactivating = !existing.status.holds_seats() && status.holds_seats();
        if reactivating {
            let event = Event::find(&self.pool, existing.event_id)
                .await?
                .ok_or(BookingRejection::EventNotFound)?;
            check_event_bookable(&event, Utc::now())?;
        }

        let updated = if reactivating {
            sqlx::query_as::<_, Booking>(&format!(
                "UPDATE bookings SET status = ? WHERE id = ? AND {SEAT_GUARD} RETURNING {BOOKING_COLUMNS}"
            ))
            .bind(status)
            .bind(id)
            .bind(existing.event_id)
            .bind(id)
            .bind(existing.quantity)
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Booking>(&format!(
                "UPDATE bookings SET status = ? WHERE id = ? RETURNING {BOOKING_COLUMNS}"
            ))
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        };

        match updated {
            Some(booking) => {
                info!("booking {} status {} -> {}", booking.booking_code, existing.status, booking.status);
                Ok(booking)
            }
            None if reactivating => {
                Err(self.guard_failure(existing.event_id, Some(id), existing.quantity).await)
            }
            None => Err(AppError::not_found("Booking")),
        }
    }

    pub async fn cancel(&self, id: i64) -> AppResult<()> {
        if !Booking::cancel(&self.pool, id).await? {
            return Err(AppError::not_found("Booking"));
        }
        info!("booking {} cancelled", id);
        Ok(())
    }

    /// Explains why a guarded write matched no row.
    async fn guard_failure(&self, event_id: i64, exclude: Option<i64>, requested: i64) -> AppError {
        match Availability::load(&self.pool, event_id, exclude).await {
            Ok(None) => BookingRejection::EventNotFound.into(),
            Ok(Some(availability)) => match availability.status {
                EventStatus::Active => BookingRejection::CapacityExceeded {
                    available: availability.available(),
                    requested,
                }
                .into(),
                status @ (EventStatus::Cancelled | EventStatus::Completed) => {
                    BookingRejection::EventNotActive(status).into()
                }
            },
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn event(status: EventStatus, event_date: DateTime<Utc>) -> Event {
        Event {
            id: 1,
            name: "Concert".into(),
            description: None,
            event_date,
            venue_id: 1,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn capacity_100_price_50_quantity_3() {
        assert_eq!(total_price(50.0, 3), 150.0);
        assert_eq!(check_capacity(100, 0, 3), Ok(97));
    }

    #[test]
    fn capacity_rejection_reports_what_is_left() {
        assert_eq!(
            check_capacity(10, 8, 3),
            Err(BookingRejection::CapacityExceeded { available: 2, requested: 3 })
        );
        assert_eq!(check_capacity(10, 7, 3), Ok(0));
    }

    #[test]
    fn prices_are_rounded_to_cents() {
        assert_eq!(total_price(19.99, 3), 59.97);
        assert_eq!(round_money(0.125 + 0.0001), 0.13);
        assert_eq!(percentage(1.0, 3.0), 33.33);
        assert_eq!(percentage(5.0, 0.0), 0.0);
    }

    #[test]
    fn only_active_future_events_are_bookable() {
        let now = Utc::now();
        let later = now + Duration::days(1);

        assert!(check_event_bookable(&event(EventStatus::Active, later), now).is_ok());
        assert_eq!(
            check_event_bookable(&event(EventStatus::Cancelled, later), now),
            Err(BookingRejection::EventNotActive(EventStatus::Cancelled))
        );
        assert_eq!(
            check_event_bookable(&event(EventStatus::Active, now - Duration::hours(1)), now),
            Err(BookingRejection::EventInPast)
        );
    }

    #[test]
    fn booking_code_carries_creation_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let code = generate_booking_code(now);

        assert!(code.starts_with("BK-20260314-"));
        assert_eq!(code.len(), "BK-20260314-".len() + 6);
        assert!(code[12..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(code, generate_booking_code(now));
    }

    proptest! {
        #[test]
        fn granted_seats_never_exceed_capacity(
            capacity in 1i64..5_000,
            reserved in 0i64..5_000,
            requested in 1i64..=10,
        ) {
            match check_capacity(capacity, reserved, requested) {
                Ok(remaining) => {
                    prop_assert!(reserved + requested <= capacity);
                    prop_assert_eq!(remaining, capacity - reserved - requested);
                }
                Err(BookingRejection::CapacityExceeded { available, requested: r }) => {
                    prop_assert_eq!(r, requested);
                    prop_assert!(available < requested);
                }
                Err(other) => prop_assert!(false, "unexpected rejection {:?}", other),
            }
        }

        #[test]
        fn total_is_quantity_times_price(cents in 1i64..100_000, quantity in 1i64..=10) {
            let price = cents as f64 / 100.0;
            let expected = (cents * quantity) as f64 / 100.0;
            prop_assert!((total_price(price, quantity) - expected).abs() < 1e-9);
        }
    }
}
