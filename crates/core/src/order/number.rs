//! Order numbers and timestamps.

use chrono::{Datelike, NaiveDateTime};
use orderdesk_shared::types::OrderId;

/// Format of order and update timestamps as stored and exchanged.
pub const ORDER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Next order number: `YYYYMM` followed by a four digit sequence.
///
/// `existing_orders` is the number of orders already on file, including
/// soft-deleted ones, so numbers are never reused.
#[must_use]
pub fn next_order_id(now: NaiveDateTime, existing_orders: u64) -> OrderId {
    let year = u64::try_from(now.year()).unwrap_or_default();
    let month = u64::from(now.month());
    let number = year * 1_000_000 + month * 10_000 + existing_orders + 1;
    OrderId::new(number.to_string())
}

/// Renders a timestamp in [`ORDER_TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(ORDER_TIMESTAMP_FORMAT).to_string()
}

/// Parses a timestamp in [`ORDER_TIMESTAMP_FORMAT`].
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), ORDER_TIMESTAMP_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_first_order_of_the_month() {
        assert_eq!(next_order_id(at(2025, 1, 13), 0).as_str(), "2025010001");
    }

    #[test]
    fn test_sequence_follows_count() {
        assert_eq!(next_order_id(at(2025, 3, 2), 6).as_str(), "2025030007");
        assert_eq!(next_order_id(at(2024, 12, 31), 41).as_str(), "2024120042");
    }

    #[test]
    fn test_timestamp_round_trip() {
        let stamp = format_timestamp(at(2025, 1, 13));
        assert_eq!(stamp, "2025-01-13 15:30:00");
        assert_eq!(parse_timestamp(&stamp).unwrap(), at(2025, 1, 13));
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        assert!(parse_timestamp("2025-01-13T15:30:00").is_err());
        assert!(parse_timestamp("13/01/2025").is_err());
    }
}
