//! Exchange rate sources.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by a rate source.
#[derive(Debug, Error)]
pub enum RateSourceError {
    /// Transport failure, including timeouts.
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("rate endpoint returned status {0}")]
    Status(u16),

    /// Body could not be interpreted as a rate payload.
    #[error("invalid rate payload: {0}")]
    Payload(String),
}

/// Quotes keyed by currency code: units of that currency per one base unit.
pub type Quotes = Vec<(String, Decimal)>;

/// Something that can produce a fresh set of quotes against the base currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the latest quotes.
    async fn fetch_quotes(&self) -> Result<Quotes, RateSourceError>;
}

/// Rate source backed by a JSON endpoint of the `open.er-api.com` shape.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRateSource {
    /// Creates a source for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RateSourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Endpoint this source reads from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_quotes(&self) -> Result<Quotes, RateSourceError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateSourceError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        parse_quotes(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RatePayload {
    #[serde(default)]
    result: Option<String>,
    rates: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Parses a body of the form `{"result": "success", "rates": {"USD": 0.74}}`.
///
/// Numbers are read from their textual form so quotes keep their exact
/// decimal digits.
pub fn parse_quotes(body: &str) -> Result<Quotes, RateSourceError> {
    let payload: RatePayload =
        serde_json::from_str(body).map_err(|e| RateSourceError::Payload(e.to_string()))?;

    if let Some(result) = payload.result.as_deref()
        && result != "success"
    {
        return Err(RateSourceError::Payload(format!("result was '{result}'")));
    }

    let rates = payload
        .rates
        .ok_or_else(|| RateSourceError::Payload("missing 'rates' object".to_string()))?;

    rates
        .into_iter()
        .map(|(code, value)| {
            let quote = match &value {
                serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
                serde_json::Value::String(s) => parse_decimal(s),
                _ => None,
            }
            .ok_or_else(|| RateSourceError::Payload(format!("rate for {code} is not a number")))?;
            Ok((code, quote))
        })
        .collect()
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
