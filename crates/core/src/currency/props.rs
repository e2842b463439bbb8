//! Property-based tests for currency operations.

use orderdesk_shared::types::CurrencyCode;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::conversion::{convert, round_money};
use super::table::RateTable;

const CODES: [&str; 11] = [
    "SGD", "USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CNY", "HKD", "INR", "MYR",
];

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive quotes (0.0001 to 10000.0000).
fn positive_quote() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn known_code() -> impl Strategy<Value = CurrencyCode> {
    prop::sample::select(CODES.to_vec()).prop_map(|c| c.parse().unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converting to the same currency returns the amount untouched.
    #[test]
    fn prop_identity_conversion(
        amount in positive_amount(),
        currency in known_code(),
    ) {
        let table = RateTable::defaults();
        prop_assert_eq!(convert(amount, currency, currency, &table), Ok(amount));
    }

    /// Converting there and back lands on the original amount once rounded.
    #[test]
    fn prop_round_trip_conversion(
        amount in positive_amount(),
        source in known_code(),
        target in known_code(),
    ) {
        let table = RateTable::defaults();
        let there = convert(amount, source, target, &table).unwrap();
        let back = convert(there, target, source, &table).unwrap();
        prop_assert_eq!(round_money(back), amount);
    }

    /// Positive amounts stay positive.
    #[test]
    fn prop_positive_inputs_positive_output(
        amount in positive_amount(),
        source in known_code(),
        target in known_code(),
    ) {
        let table = RateTable::defaults();
        prop_assert!(convert(amount, source, target, &table).unwrap() > Decimal::ZERO);
    }

    /// Rounded money never carries more than two decimal places.
    #[test]
    fn prop_round_money_two_places(
        amount in positive_amount(),
        source in known_code(),
        target in known_code(),
    ) {
        let table = RateTable::defaults();
        let rounded = round_money(convert(amount, source, target, &table).unwrap());
        let scaled = rounded * Decimal::from(100);
        prop_assert_eq!(scaled, scaled.round());
    }

    /// A fetched quote is stored as its reciprocal.
    #[test]
    fn prop_quotes_are_inverted(quote in positive_quote()) {
        let table = RateTable::from_quotes([("EUR".to_string(), quote)]).unwrap();
        let rate = table.get_rate("EUR");
        let product = rate * quote;
        let error = (product - Decimal::ONE).abs();
        prop_assert!(error < Decimal::new(1, 20), "rate {} * quote {} = {}", rate, quote, product);
    }
}
