//! Tests for the exchange rate cache.

use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::TimeZone;
use rust_decimal_macros::dec;

use super::*;
use crate::currency::source::{Quotes, RateSourceError};

/// Source that replays scripted results and counts calls.
struct ScriptedSource {
    calls: AtomicUsize,
    script: StdMutex<VecDeque<Result<Quotes, String>>>,
    delay: Duration,
}

impl ScriptedSource {
    fn new(script: Vec<Result<Quotes, String>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: StdMutex::new(script.into()),
            delay: Duration::ZERO,
        })
    }

    fn slow(script: Vec<Result<Quotes, String>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: StdMutex::new(script.into()),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for ScriptedSource {
    async fn fetch_quotes(&self) -> Result<Quotes, RateSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(quotes)) => Ok(quotes),
            Some(Err(msg)) => Err(RateSourceError::Payload(msg)),
            None => Err(RateSourceError::Payload("script exhausted".to_string())),
        }
    }
}

fn usd_quote(quote: Decimal) -> Result<Quotes, String> {
    Ok(vec![("USD".to_string(), quote)])
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

fn hours(h: i64) -> chrono::Duration {
    chrono::Duration::hours(h)
}

fn cache_with(source: Arc<ScriptedSource>) -> ExchangeRateCache {
    ExchangeRateCache::new(source, RefreshPolicy::default())
}

#[test]
fn test_starts_with_defaults() {
    let cache = cache_with(ScriptedSource::new(vec![]));
    assert_eq!(*cache.snapshot(), RateTable::defaults());
    assert!(cache.last_refreshed().is_none());
    assert_eq!(cache.get_rate("usd"), dec!(1.35));
}

#[tokio::test]
async fn test_successful_refresh_installs_inverted_rates() {
    let source = ScriptedSource::new(vec![usd_quote(dec!(0.8))]);
    let cache = cache_with(source.clone());

    let outcome = cache.refresh_at(t0()).await;

    assert_eq!(outcome, RefreshOutcome::Updated { currencies: 11 });
    assert_eq!(cache.get_rate("USD"), dec!(1.25));
    assert_eq!(cache.get_rate("SGD"), Decimal::ONE);
    assert_eq!(cache.last_refreshed(), Some(t0()));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_failed_refresh_reinstates_defaults() {
    let source = ScriptedSource::new(vec![
        usd_quote(dec!(0.8)),
        Err("connection refused".to_string()),
    ]);
    let cache = cache_with(source);

    cache.refresh_at(t0()).await;
    assert_eq!(cache.get_rate("USD"), dec!(1.25));

    let outcome = cache.refresh_at(t0() + hours(25)).await;

    assert_eq!(outcome, RefreshOutcome::FellBack);
    assert_eq!(*cache.snapshot(), RateTable::defaults());
    // Failure leaves the success timestamp alone.
    assert_eq!(cache.last_refreshed(), Some(t0()));
}

#[tokio::test]
async fn test_malformed_quotes_are_discarded_whole() {
    let source = ScriptedSource::new(vec![Ok(vec![
        ("USD".to_string(), dec!(0.8)),
        ("EUR".to_string(), dec!(-1)),
    ])]);
    let cache = cache_with(source);

    assert_eq!(cache.refresh_at(t0()).await, RefreshOutcome::FellBack);
    assert_eq!(cache.get_rate("USD"), dec!(1.35));
    assert!(cache.last_refreshed().is_none());
}

#[tokio::test]
async fn test_first_stale_check_always_fetches() {
    let source = ScriptedSource::new(vec![usd_quote(dec!(0.8))]);
    let cache = cache_with(source.clone());

    assert!(cache.refresh_if_stale_at(t0()).await.is_some());
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_no_refetch_within_interval() {
    let source = ScriptedSource::new(vec![usd_quote(dec!(0.8)), usd_quote(dec!(0.5))]);
    let cache = cache_with(source.clone());

    cache.refresh_if_stale_at(t0()).await;
    assert!(cache.refresh_if_stale_at(t0() + hours(1)).await.is_none());
    assert!(cache.refresh_if_stale_at(t0() + hours(24)).await.is_none());
    assert_eq!(source.calls(), 1);
    assert_eq!(cache.get_rate("USD"), dec!(1.25));
}

#[tokio::test]
async fn test_refetch_once_interval_elapsed() {
    let source = ScriptedSource::new(vec![usd_quote(dec!(0.8)), usd_quote(dec!(0.5))]);
    let cache = cache_with(source.clone());

    cache.refresh_if_stale_at(t0()).await;
    let outcome = cache.refresh_if_stale_at(t0() + hours(25)).await;

    assert_eq!(outcome, Some(RefreshOutcome::Updated { currencies: 11 }));
    assert_eq!(source.calls(), 2);
    assert_eq!(cache.get_rate("USD"), dec!(2));
    assert_eq!(cache.last_refreshed(), Some(t0() + hours(25)));
}

#[tokio::test]
async fn test_failure_backs_off_before_retrying() {
    let source = ScriptedSource::new(vec![Err("down".to_string()), usd_quote(dec!(0.8))]);
    let cache = cache_with(source.clone());

    assert_eq!(
        cache.refresh_if_stale_at(t0()).await,
        Some(RefreshOutcome::FellBack)
    );
    assert!(
        cache
            .refresh_if_stale_at(t0() + chrono::Duration::seconds(30))
            .await
            .is_none()
    );
    assert_eq!(source.calls(), 1);

    let retried = cache
        .refresh_if_stale_at(t0() + chrono::Duration::seconds(61))
        .await;
    assert_eq!(retried, Some(RefreshOutcome::Updated { currencies: 11 }));
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_stale_checks_fetch_once() {
    let source = ScriptedSource::slow(
        vec![usd_quote(dec!(0.8)), usd_quote(dec!(0.5))],
        Duration::from_millis(50),
    );
    let cache = Arc::new(cache_with(source.clone()));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refresh_if_stale_at(t0()).await })
        })
        .collect();
    let results = futures::future::join_all(tasks).await;

    let fetched = results
        .into_iter()
        .filter(|r| r.as_ref().unwrap().is_some())
        .count();
    assert_eq!(fetched, 1);
    assert_eq!(source.calls(), 1);
    assert_eq!(cache.get_rate("USD"), dec!(1.25));
}

#[tokio::test]
async fn test_snapshot_is_stable_across_refresh() {
    let source = ScriptedSource::new(vec![usd_quote(dec!(0.8))]);
    let cache = cache_with(source);

    let before = cache.snapshot();
    cache.refresh_at(t0()).await;

    assert_eq!(before.get_rate("USD"), dec!(1.35));
    assert_eq!(cache.snapshot().get_rate("USD"), dec!(1.25));
}
