//! Order invoices.
//!
//! Line items are priced in the requested currency against a snapshot of the
//! exchange rate cache, written into the `Invoice` sheet of a fixed-layout
//! workbook, and stored before being handed back for download.

pub mod error;
pub mod layout;
pub mod resolver;
pub mod service;
pub mod types;
pub mod writer;


pub use error::InvoiceError;
pub use resolver::{ProductCatalog, price_line, resolve_lines};
pub use service::{InvoiceRequest, InvoiceService};
pub use types::{
    Invoice, InvoiceHeader, InvoiceLine, ProductSnapshot, RenderedInvoice, invoice_file_name,
};
pub use writer::InvoiceWriter;
