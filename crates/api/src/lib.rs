//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for customers, products, orders and currencies
//! - Authentication middleware
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use axum::Router;
use orderdesk_core::currency::ExchangeRateCache;
use orderdesk_core::invoice::InvoiceWriter;
use orderdesk_core::storage::StorageService;
use orderdesk_shared::JwtService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Exchange rate cache used for conversions and invoices.
    pub rates: Arc<ExchangeRateCache>,
    /// Storage for profile images and generated invoices.
    pub storage: Arc<StorageService>,
    /// Invoice spreadsheet writer.
    pub invoice_writer: Arc<InvoiceWriter>,
    /// Storage prefix for generated invoices.
    pub invoice_prefix: Arc<str>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
