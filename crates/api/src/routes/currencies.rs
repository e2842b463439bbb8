//! Exchange rate routes.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use orderdesk_core::currency::{
    BASE_CURRENCY, ExchangeRateCache, RateTable, RefreshOutcome, convert, round_money,
};
use orderdesk_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::extractors::AppQuery;
use crate::{AppState, middleware::AuthUser};

/// Creates the currency routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/currencies/rates", get(get_rates))
        .route("/currencies/refresh", post(refresh_rates))
        .route("/currencies/convert", get(convert_amount))
}

/// Current rate table.
#[derive(Debug, Serialize)]
pub struct RatesResponse {
    /// Currency every rate is expressed in.
    pub base: CurrencyCode,
    /// Last successful fetch; `null` while on built-in defaults.
    pub last_refreshed: Option<DateTime<Utc>>,
    /// Units of base currency per one unit of each currency.
    pub rates: BTreeMap<CurrencyCode, Decimal>,
}

impl RatesResponse {
    fn from_cache(cache: &ExchangeRateCache) -> Self {
        Self::new(&cache.snapshot(), cache.last_refreshed())
    }

    fn new(table: &RateTable, last_refreshed: Option<DateTime<Utc>>) -> Self {
        Self {
            base: BASE_CURRENCY,
            last_refreshed,
            rates: table.iter().collect(),
        }
    }
}

/// Result of a forced refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// `updated` or `fell_back`.
    pub outcome: &'static str,
    /// Table after the refresh.
    #[serde(flatten)]
    pub rates: RatesResponse,
}

/// Query parameters for a conversion.
#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    /// Amount in `from`.
    pub amount: Decimal,
    /// Source currency.
    pub from: CurrencyCode,
    /// Target currency.
    pub to: CurrencyCode,
}

/// Converted amount.
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    /// Amount as given.
    pub amount: Decimal,
    /// Source currency.
    pub from: CurrencyCode,
    /// Target currency.
    pub to: CurrencyCode,
    /// Amount in `to`, rounded to cents.
    pub converted: Decimal,
}

/// GET `/currencies/rates`
async fn get_rates(State(state): State<AppState>) -> Json<RatesResponse> {
    Json(RatesResponse::from_cache(&state.rates))
}

/// POST `/currencies/refresh` (superuser) - fetch now, ignoring the interval.
async fn refresh_rates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<RefreshResponse>> {
    auth.require_superuser()?;

    let outcome = match state.rates.refresh().await {
        RefreshOutcome::Updated { .. } => "updated",
        RefreshOutcome::FellBack => "fell_back",
    };
    info!(outcome, by = auth.subject(), "Manual exchange rate refresh");

    Ok(Json(RefreshResponse {
        outcome,
        rates: RatesResponse::from_cache(&state.rates),
    }))
}

/// GET `/currencies/convert?amount=&from=&to=`
async fn convert_amount(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ConvertQuery>,
) -> ApiResult<Json<ConvertResponse>> {
    state.rates.refresh_if_stale().await;
    let table = state.rates.snapshot();
    let converted = convert(query.amount, query.from, query.to, &table)?;

    Ok(Json(ConvertResponse {
        amount: query.amount,
        from: query.from,
        to: query.to,
        converted: round_money(converted),
    }))
}
