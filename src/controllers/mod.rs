pub mod venues;
pub mod events;
pub mod ticket_types;
pub mod bookings;
pub mod stats;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(venues::routes())
        .merge(events::routes())
        .merge(ticket_types::routes())
        .merge(bookings::routes())
        .merge(stats::routes())
}
