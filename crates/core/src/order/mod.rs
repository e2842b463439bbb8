//! Orders: line items, statuses and numbering.

pub mod items;
pub mod number;
pub mod status;

pub use items::{LineItem, LineItemError, ORDER_ITEMS_VERSION, OrderItems};
pub use number::{ORDER_TIMESTAMP_FORMAT, format_timestamp, next_order_id, parse_timestamp};
pub use status::{OrderStatus, PaymentStatus, StatusParseError};
