//! Invoice error types.

use thiserror::Error;

use crate::order::LineItemError;
use crate::storage::StorageError;

/// Invoice generation errors.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// A line item references a product that is not in the catalog.
    #[error("line item references unknown product {product_id}")]
    UnresolvableLineItem {
        /// Offending product id.
        product_id: String,
    },

    /// More line items than the template has rows for.
    #[error("invoice has {count} line items but the template holds {capacity}")]
    TooManyLines {
        /// Number of line items on the order.
        count: usize,
        /// Item slots available in the template.
        capacity: usize,
    },

    /// A converted unit price or subtotal does not fit in a `Decimal`.
    #[error("pricing product {product_id} overflows")]
    PriceOverflow {
        /// Product whose line overflowed.
        product_id: String,
    },

    /// The sum of the subtotals does not fit in a `Decimal`.
    #[error("invoice total overflows")]
    TotalOverflow,

    /// Stored line items could not be decoded.
    #[error(transparent)]
    LineItems(#[from] LineItemError),

    /// Product lookup failed for a reason other than absence.
    #[error("product catalog lookup failed: {0}")]
    Catalog(String),

    /// Template missing, unreadable, or without an `Invoice` sheet.
    #[error("invoice template error: {0}")]
    Template(String),

    /// Workbook could not be serialized.
    #[error("failed to write invoice: {0}")]
    Render(String),

    /// Persisting the rendered invoice failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl InvoiceError {
    /// Create an unresolvable line item error.
    #[must_use]
    pub fn unresolvable(product_id: impl Into<String>) -> Self {
        Self::UnresolvableLineItem {
            product_id: product_id.into(),
        }
    }
}
