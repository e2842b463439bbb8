//! Process-wide exchange rate cache.
//!
//! Readers always see a complete table: a refresh builds the replacement
//! off to the side and swaps the `Arc` in a single write. Refreshers are
//! serialized so concurrent callers never fetch twice for one stale period.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::source::RateSource;
use super::table::RateTable;

/// Default minimum age before a refresh re-fetches (24 hours).
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Default wait after a failed fetch before trying again.
const DEFAULT_RETRY_AFTER_FAILURE_SECS: u64 = 60;

/// When the cache is allowed to hit the rate source again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Age past which a successfully fetched table is stale.
    pub interval: Duration,
    /// Wait after a failed fetch before the next attempt.
    pub retry_after_failure: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            retry_after_failure: Duration::from_secs(DEFAULT_RETRY_AFTER_FAILURE_SECS),
        }
    }
}

/// Result of a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fetched quotes replaced the table.
    Updated {
        /// Number of currencies in the new table.
        currencies: usize,
    },
    /// The fetch failed and the built-in defaults were installed.
    FellBack,
}

#[derive(Debug)]
struct CacheState {
    table: Arc<RateTable>,
    last_refreshed: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
}

/// Shared cache of the current exchange rate table.
pub struct ExchangeRateCache {
    source: Arc<dyn RateSource>,
    policy: RefreshPolicy,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for ExchangeRateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRateCache")
            .field("policy", &self.policy)
            .field("last_refreshed", &self.last_refreshed())
            .finish_non_exhaustive()
    }
}

impl ExchangeRateCache {
    /// Creates a cache seeded with the default table. Nothing is fetched
    /// until the first refresh.
    #[must_use]
    pub fn new(source: Arc<dyn RateSource>, policy: RefreshPolicy) -> Self {
        Self {
            source,
            policy,
            state: RwLock::new(CacheState {
                table: Arc::new(RateTable::defaults()),
                last_refreshed: None,
                last_failure: None,
            }),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current table. The returned snapshot never changes underneath the caller.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RateTable> {
        Arc::clone(&self.read_state().table)
    }

    /// Case-insensitive rate lookup with fallback to USD.
    #[must_use]
    pub fn get_rate(&self, currency: &str) -> Decimal {
        self.snapshot().get_rate(currency)
    }

    /// Time of the last successful refresh.
    #[must_use]
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.read_state().last_refreshed
    }

    /// Refresh policy in effect.
    #[must_use]
    pub const fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Fetches unconditionally and installs the result.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresh_at(Utc::now()).await
    }

    /// Fetches only if the table is stale. Returns `None` when no fetch ran.
    pub async fn refresh_if_stale(&self) -> Option<RefreshOutcome> {
        self.refresh_if_stale_at(Utc::now()).await
    }

    /// [`Self::refresh`] with an explicit clock reading.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> RefreshOutcome {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_install(now).await
    }

    /// [`Self::refresh_if_stale`] with an explicit clock reading.
    pub async fn refresh_if_stale_at(&self, now: DateTime<Utc>) -> Option<RefreshOutcome> {
        if !self.is_stale(now) {
            return None;
        }
        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if !self.is_stale(now) {
            return None;
        }
        Some(self.fetch_and_install(now).await)
    }

    /// Whether a refresh at `now` would hit the source.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let state = self.read_state();
        if let Some(at) = state.last_refreshed
            && !elapsed_more_than(at, now, self.policy.interval)
        {
            return false;
        }
        if let Some(at) = state.last_failure
            && !elapsed_more_than(at, now, self.policy.retry_after_failure)
        {
            return false;
        }
        true
    }

    async fn fetch_and_install(&self, now: DateTime<Utc>) -> RefreshOutcome {
        let fetched = self.source.fetch_quotes().await.map_err(|e| e.to_string());
        let table = fetched.and_then(|quotes| RateTable::from_quotes(quotes).map_err(|e| e.to_string()));

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match table {
            Ok(table) => {
                let currencies = table.len();
                state.table = Arc::new(table);
                state.last_refreshed = Some(now);
                state.last_failure = None;
                info!(currencies, "Exchange rates refreshed");
                RefreshOutcome::Updated { currencies }
            }
            Err(error) => {
                state.table = Arc::new(RateTable::defaults());
                state.last_failure = Some(now);
                warn!(error = %error, "Failed to fetch exchange rates, using default rates");
                RefreshOutcome::FellBack
            }
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn elapsed_more_than(since: DateTime<Utc>, now: DateTime<Utc>, limit: Duration) -> bool {
    let limit = chrono::Duration::from_std(limit).unwrap_or(chrono::Duration::MAX);
    now.signed_duration_since(since) > limit
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
