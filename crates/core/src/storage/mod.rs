//! Object storage for profile images and generated invoices, using Apache
//! OpenDAL.
//!
//! Supported backends:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Local filesystem
//! - In-process memory

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider, XLSX_CONTENT_TYPE};
pub use error::StorageError;
pub use service::{StorageService, StoredObject};
