//! Terminal dashboard for the booking API.
//!
//! `client` talks HTTP, `render` turns the decoded responses into text.
//! Nothing here touches the database directly.

pub mod client;
pub mod render;

pub use client::{ApiClient, CancelResponse, ClientError};
