pub mod booking;

pub use booking::{Availability, BookingRejection, BookingService, Quote};
