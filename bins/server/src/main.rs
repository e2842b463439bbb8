//! Orderdesk API Server
//!
//! Main entry point for the Orderdesk backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderdesk_api::{AppState, create_router};
use orderdesk_core::currency::{ExchangeRateCache, HttpRateSource, RefreshOutcome, RefreshPolicy};
use orderdesk_core::invoice::InvoiceWriter;
use orderdesk_core::storage::{StorageConfig, StorageProvider, StorageService};
use orderdesk_db::connect_pool;
use orderdesk_shared::config::CurrencyConfig;
use orderdesk_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_pool(&config.database).await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    let rates = Arc::new(rate_cache(&config.currency)?);
    match rates.refresh().await {
        RefreshOutcome::Updated { currencies } => {
            info!(currencies, "Exchange rates loaded");
        }
        RefreshOutcome::FellBack => warn!("Rate source unavailable, serving default rates"),
    }
    spawn_rate_refresher(
        Arc::clone(&rates),
        Duration::from_secs(config.currency.background_tick_secs.max(1)),
    );

    let storage = StorageService::from_config(StorageConfig::new(
        StorageProvider::from_settings(&config.storage)?,
    ))?;
    info!(provider = storage.provider_name(), "Storage configured");

    let invoice_writer = match &config.invoice.template_path {
        Some(path) => {
            info!(template = %path.display(), "Using invoice template");
            InvoiceWriter::from_template_path(path)?
        }
        None => InvoiceWriter::builtin(),
    };

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        rates,
        storage: Arc::new(storage),
        invoice_writer: Arc::new(invoice_writer),
        invoice_prefix: Arc::from(config.invoice.output_prefix.as_str()),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn rate_cache(config: &CurrencyConfig) -> anyhow::Result<ExchangeRateCache> {
    let source = HttpRateSource::new(
        config.api_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let policy = RefreshPolicy {
        interval: Duration::from_secs(config.refresh_interval_hours.saturating_mul(3600)),
        retry_after_failure: Duration::from_secs(config.retry_after_failure_secs),
    };
    info!(url = %config.api_url, "Rate source configured");
    Ok(ExchangeRateCache::new(Arc::new(source), policy))
}

/// Keeps the rate table fresh between requests.
fn spawn_rate_refresher(rates: Arc<ExchangeRateCache>, tick: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately and startup already refreshed.
        interval.tick().await;
        loop {
            interval.tick().await;
            match rates.refresh_if_stale().await {
                Some(RefreshOutcome::Updated { currencies }) => {
                    info!(currencies, "Exchange rates refreshed");
                }
                Some(RefreshOutcome::FellBack) => {
                    warn!("Rate refresh failed, serving default rates");
                }
                None => debug!("Exchange rates still fresh"),
            }
        }
    });
}
