//! API route definitions.

use axum::{Router, middleware};
use orderdesk_shared::types::PageRequest;
use serde::Serialize;

use crate::{AppState, middleware::auth_middleware};

pub mod currencies;
pub mod customers;
pub mod health;
pub mod orders;
pub mod products;

#[cfg(test)]
mod tests;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Everything except health requires a bearer token
    let protected_routes = Router::new()
        .merge(customers::routes())
        .merge(products::routes())
        .merge(orders::routes())
        .merge(currencies::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Plain `{"message": ...}` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human readable outcome.
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Builds a page request from optional `skip`/`limit` query values.
pub(crate) fn page_request(skip: Option<u64>, limit: Option<u64>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest {
        skip: skip.unwrap_or(defaults.skip),
        limit: limit.unwrap_or(defaults.limit),
    }
}
