//! Currency conversion logic.
//!
//! Conversion runs at full `Decimal` precision. Rounding is a separate step
//! applied only where a value is presented or summed for an invoice.

use orderdesk_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use thiserror::Error;

use super::table::RateTable;

/// Decimal places used for every presented money value.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// The converted amount does not fit in a `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("converting {amount} {from} to {to} overflows")]
pub struct ConversionOverflow {
    /// Amount that was being converted.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub from: CurrencyCode,
    /// Requested currency.
    pub to: CurrencyCode,
}

/// Converts `amount` from `source` to `target` using `table`.
///
/// Identical currencies return the amount unchanged. Unknown codes fall back
/// to the table's fallback rate.
pub fn convert(
    amount: Decimal,
    source: CurrencyCode,
    target: CurrencyCode,
    table: &RateTable,
) -> Result<Decimal, ConversionOverflow> {
    if source == target {
        return Ok(amount);
    }
    amount
        .checked_mul(table.rate(source))
        .and_then(|base| base.checked_div(table.rate(target)))
        .ok_or(ConversionOverflow {
            amount,
            from: source,
            to: target,
        })
}

/// Rounds to `decimal_places` using banker's rounding (round half to even).
#[must_use]
pub fn round_dp(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}

/// Rounds a money value to two decimal places.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    round_dp(value, MONEY_DECIMAL_PLACES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_identity_conversion() {
        let table = RateTable::defaults();
        assert_eq!(
            convert(dec!(123.456), code("EUR"), code("EUR"), &table).unwrap(),
            dec!(123.456)
        );
    }

    #[test]
    fn test_usd_to_sgd() {
        let table = RateTable::defaults();
        assert_eq!(
            convert(dec!(10), CurrencyCode::USD, CurrencyCode::SGD, &table).unwrap(),
            dec!(13.5)
        );
    }

    #[test]
    fn test_sgd_to_eur() {
        // 1.45 SGD buys one EUR
        let table = RateTable::defaults();
        let eur = convert(dec!(14.5), CurrencyCode::SGD, code("EUR"), &table).unwrap();
        assert_eq!(eur, dec!(10));
    }

    #[test]
    fn test_cross_conversion_through_base() {
        let table = RateTable::defaults();
        // 1 GBP = 1.70 SGD, 1 USD = 1.35 SGD
        let usd = convert(dec!(1.35), code("GBP"), CurrencyCode::USD, &table).unwrap();
        assert_eq!(round_money(usd), dec!(1.70));
    }

    #[test]
    fn test_unknown_source_treated_as_usd() {
        let table = RateTable::defaults();
        assert_eq!(
            convert(dec!(2), code("XYZ"), CurrencyCode::SGD, &table).unwrap(),
            dec!(2.70)
        );
    }

    #[test]
    fn test_unknown_target_treated_as_usd() {
        let table = RateTable::defaults();
        assert_eq!(
            convert(dec!(2.70), CurrencyCode::SGD, code("XYZ"), &table).unwrap(),
            dec!(2)
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let table = RateTable::defaults();
        let err = convert(Decimal::MAX, CurrencyCode::USD, CurrencyCode::SGD, &table).unwrap_err();
        assert_eq!(err.amount, Decimal::MAX);
        assert_eq!(err.from, CurrencyCode::USD);
        assert_eq!(err.to, CurrencyCode::SGD);
    }

    #[test]
    fn test_max_amount_to_same_currency_is_untouched() {
        let table = RateTable::defaults();
        assert_eq!(
            convert(Decimal::MAX, CurrencyCode::SGD, CurrencyCode::SGD, &table),
            Ok(Decimal::MAX)
        );
    }

    #[test]
    fn test_bankers_rounding() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.34));
        assert_eq!(round_money(dec!(2.355)), dec!(2.36));
        assert_eq!(round_dp(dec!(2.5), 0), dec!(2));
        assert_eq!(round_dp(dec!(3.5), 0), dec!(4));
    }

    #[test]
    fn test_round_money_keeps_exact_values() {
        assert_eq!(round_money(dec!(6.75)), dec!(6.75));
        assert_eq!(round_money(dec!(20)), dec!(20.00));
    }
}
