//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Liveness report.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` when the process answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Last successful exchange rate fetch; `null` while on defaults.
    pub rates_refreshed_at: Option<DateTime<Utc>>,
    /// Active storage backend.
    pub storage: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        rates_refreshed_at: state.rates.last_refreshed(),
        storage: state.storage.provider_name(),
    })
}

/// Public routes: no token required.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
