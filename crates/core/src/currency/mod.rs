//! Multi-currency handling and exchange rates.

pub mod cache;
pub mod conversion;
pub mod source;
pub mod table;

#[cfg(test)]
mod props;

pub use cache::{ExchangeRateCache, RefreshOutcome, RefreshPolicy};
pub use conversion::{
    ConversionOverflow, MONEY_DECIMAL_PLACES, convert, round_dp, round_money,
};
pub use source::{HttpRateSource, Quotes, RateSource, RateSourceError};
pub use table::{BASE_CURRENCY, FALLBACK_CURRENCY, RateTable, RateTableError};
