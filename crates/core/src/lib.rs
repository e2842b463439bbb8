//! Core business logic for Orderdesk.
//!
//! This crate contains pure business logic with no web or database dependencies.
//! Persistence is reached through traits implemented by the db crate.
//!
//! # Modules
//!
//! - `currency` - Exchange rate table, cache and conversion
//! - `order` - Line items, statuses and order numbering
//! - `invoice` - Line item pricing and the invoice workbook
//! - `storage` - Object storage for images and invoices

pub mod currency;
pub mod invoice;
pub mod order;
pub mod storage;
