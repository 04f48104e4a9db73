use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::models::booking::BOOKING_DETAILS_SELECT;
use crate::models::{BookingSearchQuery, BookingWithDetails};

/// Клиент для поиска бронирований
#[derive(Clone)]
pub struct SearchClient {
    pool: SqlitePool,
}

impl SearchClient {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn search_bookings(
        &self,
        query: &BookingSearchQuery,
    ) -> Result<Vec<BookingWithDetails>, sqlx::Error> {
        let mut builder = QueryBuilder::<Sqlite>::new(BOOKING_DETAILS_SELECT);
        builder.push(" WHERE 1 = 1");

        // Общий поиск по событию, площадке, клиенту и коду брони
        if let Some(term) = Self::filter_value(&query.q) {
            let pattern = Self::like_pattern(term);
            builder.push(" AND (");
            let mut any = builder.separated(" OR ");
            for column in ["e.name", "v.name", "b.customer_name", "b.booking_code"] {
                any.push(column)
                    .push_unseparated(" LIKE ")
                    .push_bind_unseparated(pattern.clone())
                    .push_unseparated(" ESCAPE '\\'");
            }
            builder.push(")");
        }

        for (column, value) in [
            ("e.name", &query.event_name),
            ("v.name", &query.venue_name),
            ("b.customer_email", &query.customer_email),
        ] {
            if let Some(term) = Self::filter_value(value) {
                builder
                    .push(format!(" AND {column} LIKE "))
                    .push_bind(Self::like_pattern(term))
                    .push(" ESCAPE '\\'");
            }
        }

        if let Some(ticket_type) = query.ticket_type {
            builder.push(" AND t.name = ").push_bind(ticket_type);
        }
        if let Some(status) = query.status {
            builder.push(" AND b.status = ").push_bind(status);
        }

        let page = query.page();
        builder
            .push(" ORDER BY b.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        debug!("booking search: {}", builder.sql());
        builder
            .build_query_as::<BookingWithDetails>()
            .fetch_all(&self.pool)
            .await
    }

    /// Empty strings count as "no filter".
    fn filter_value(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Substring pattern with LIKE wildcards in the input escaped.
    fn like_pattern(term: &str) -> String {
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}
