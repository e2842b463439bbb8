//! Exchange rate table.
//!
//! Every rate is the value of one unit of a currency expressed in the base
//! currency (SGD). Converting `amount` from `a` to `b` is therefore
//! `amount * rate(a) / rate(b)`.

use std::collections::BTreeMap;

use orderdesk_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use thiserror::Error;

/// Currency every rate is expressed against.
pub const BASE_CURRENCY: CurrencyCode = CurrencyCode::SGD;

/// Currency substituted when a lookup misses.
pub const FALLBACK_CURRENCY: CurrencyCode = CurrencyCode::USD;

/// Built-in rates as `(code, mantissa, scale)`, used until the first
/// successful fetch and whenever a fetch fails.
const DEFAULT_RATES: [(&str, i64, u32); 11] = [
    ("SGD", 100, 2),
    ("USD", 135, 2),
    ("EUR", 145, 2),
    ("GBP", 170, 2),
    ("JPY", 88, 4),
    ("AUD", 88, 2),
    ("CAD", 99, 2),
    ("CNY", 19, 2),
    ("HKD", 17, 2),
    ("INR", 16, 3),
    ("MYR", 30, 2),
];

/// Errors raised while building a table from fetched quotes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateTableError {
    /// The source returned no quotes at all.
    #[error("rate source returned no quotes")]
    Empty,

    /// A quote key is not a three letter currency code.
    #[error("invalid currency code in quotes: {0}")]
    InvalidCode(String),

    /// A quote is zero or negative and cannot be inverted.
    #[error("non-positive quote for {code}: {quote}")]
    NonPositive {
        /// Quoted currency.
        code: String,
        /// Offending quote.
        quote: Decimal,
    },
}

/// Immutable map from currency code to base-currency value.
///
/// The table always contains the base currency at exactly one and the
/// fallback currency, so [`RateTable::rate`] never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl RateTable {
    /// Returns the built-in default table.
    #[must_use]
    pub fn defaults() -> Self {
        let rates = DEFAULT_RATES
            .iter()
            .filter_map(|(code, mantissa, scale)| {
                code.parse::<CurrencyCode>()
                    .ok()
                    .map(|c| (c, Decimal::new(*mantissa, *scale)))
            })
            .collect();
        Self { rates }
    }

    /// Builds a table from quotes of the form "units of X per one base unit".
    ///
    /// Each quote is inverted so the stored value is the base-currency value
    /// of one unit of X. Fetched entries are laid over the defaults, so
    /// currencies the source omits keep their built-in rate. The base
    /// currency is pinned to one regardless of what the source says.
    ///
    /// The whole batch is rejected if any entry is malformed.
    pub fn from_quotes<I>(quotes: I) -> Result<Self, RateTableError>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut table = Self::defaults();
        let mut seen = 0usize;

        for (raw_code, quote) in quotes {
            seen += 1;
            let code: CurrencyCode = raw_code
                .parse()
                .map_err(|_| RateTableError::InvalidCode(raw_code.clone()))?;
            if quote <= Decimal::ZERO {
                return Err(RateTableError::NonPositive {
                    code: raw_code,
                    quote,
                });
            }
            table.rates.insert(code, Decimal::ONE / quote);
        }

        if seen == 0 {
            return Err(RateTableError::Empty);
        }

        table.rates.insert(BASE_CURRENCY, Decimal::ONE);
        Ok(table)
    }

    /// Exact lookup without fallback.
    #[must_use]
    pub fn lookup(&self, code: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&code).copied()
    }

    /// Rate for `code`, or the fallback currency's rate when absent.
    #[must_use]
    pub fn rate(&self, code: CurrencyCode) -> Decimal {
        self.lookup(code)
            .or_else(|| self.lookup(FALLBACK_CURRENCY))
            .unwrap_or(Decimal::ONE)
    }

    /// Case-insensitive lookup by string code.
    ///
    /// Strings that are not valid codes resolve like unknown currencies.
    #[must_use]
    pub fn get_rate(&self, currency: &str) -> Decimal {
        currency
            .parse::<CurrencyCode>()
            .map_or_else(|_| self.rate(FALLBACK_CURRENCY), |code| self.rate(code))
    }

    /// Whether `code` has its own entry.
    #[must_use]
    pub fn contains(&self, code: CurrencyCode) -> bool {
        self.rates.contains_key(&code)
    }

    /// Iterates entries in code order.
    pub fn iter(&self) -> impl Iterator<Item = (CurrencyCode, Decimal)> + '_ {
        self.rates.iter().map(|(code, rate)| (*code, *rate))
    }

    /// Number of currencies in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Always false for tables built through this module.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::defaults()
    }
}
