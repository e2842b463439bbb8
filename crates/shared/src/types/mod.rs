//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{CurrencyCode, CurrencyCodeError, Money};
pub use pagination::{CountResponse, ListResponse, PageRequest};
