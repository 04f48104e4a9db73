pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod controllers;
pub mod middleware;
pub mod services;
pub mod search_client;
#[cfg(feature = "dashboard")]
pub mod dashboard;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info_span, warn};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub bookings: services::BookingService,
    pub search_client: search_client::SearchClient,
}

impl AppState {
    /// Opens the configured database and brings its schema up to date.
    pub async fn new(
        config: config::Config,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let db = database::Database::new(&config.database).await?;
        db.run_migrations().await?;
        Ok(Self::with_database(db, config))
    }

    pub fn with_database(db: database::Database, config: config::Config) -> Arc<Self> {
        let bookings = services::BookingService::new(db.pool.clone());
        let search_client = search_client::SearchClient::new(db.pool.clone());
        Arc::new(Self { db, config, bookings, search_client })
    }
}

/// Full HTTP application: API routes plus CORS, tracing and request ids.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors.allowed_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(controllers::routes())
        .with_state(state)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to Ticket Booking System API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
        "endpoints": {
            "venues": "/venues",
            "events": "/events",
            "ticket_types": "/ticket-types",
            "bookings": "/bookings",
            "statistics": "/stats"
        }
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "message": "Ticket Booking System is running",
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("health check: database unreachable: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "database": "unreachable" })),
            )
        }
    }
}
