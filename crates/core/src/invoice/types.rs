//! Invoice domain types.

use chrono::NaiveDate;
use orderdesk_shared::types::{CurrencyCode, OrderId, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;

use super::layout::DATE_FORMAT;
use crate::storage::XLSX_CONTENT_TYPE;

/// Catalog fields the invoice needs from a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    /// Product id.
    pub id: ProductId,
    /// Brand name.
    pub brand: String,
    /// Product type.
    pub product_type: String,
    /// List price per unit.
    pub unit_price: Decimal,
    /// Currency of `unit_price`.
    pub price_currency: CurrencyCode,
}

impl ProductSnapshot {
    /// Text shown in the description column: id, brand and type.
    #[must_use]
    pub fn description(&self) -> String {
        [self.id.as_str(), self.brand.as_str(), self.product_type.as_str()]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One priced row of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLine {
    /// 1-based position on the invoice.
    pub sequence: u32,
    /// Product id.
    pub product_id: ProductId,
    /// Description column text.
    pub description: String,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price in the output currency, rounded to 2 dp.
    pub unit_price: Decimal,
    /// Quantity times the converted unit price, rounded to 2 dp.
    pub subtotal: Decimal,
}

/// Header block of an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceHeader {
    /// Order being invoiced.
    pub order_id: OrderId,
    /// Issue date.
    pub issued_on: NaiveDate,
    /// Customer company.
    pub company: String,
    /// Customer phone.
    pub phone: Option<String>,
}

/// A fully resolved invoice ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    /// Header block.
    pub header: InvoiceHeader,
    /// Output currency of all amounts.
    pub currency: CurrencyCode,
    /// Priced lines in order.
    pub lines: Vec<InvoiceLine>,
}

impl Invoice {
    /// Sum of line subtotals, `None` if it does not fit in a `Decimal`.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.subtotal))
    }

    /// Download file name of this invoice.
    #[must_use]
    pub fn file_name(&self) -> String {
        invoice_file_name(&self.header.order_id, self.header.issued_on)
    }
}

/// `Invoice_<order_id>_<dd-mm-yyyy>.xlsx`
#[must_use]
pub fn invoice_file_name(order_id: &OrderId, issued_on: NaiveDate) -> String {
    format!("Invoice_{}_{}.xlsx", order_id, issued_on.format(DATE_FORMAT))
}

/// Rendered and stored invoice.
#[derive(Debug, Clone)]
pub struct RenderedInvoice {
    /// Download file name.
    pub file_name: String,
    /// Key the workbook was stored under.
    pub storage_key: String,
    /// Workbook bytes.
    pub bytes: Vec<u8>,
    /// Output currency.
    pub currency: CurrencyCode,
    /// Invoice total.
    pub total: Decimal,
    /// Number of lines written.
    pub line_count: usize,
}

impl RenderedInvoice {
    /// MIME type of the workbook.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        XLSX_CONTENT_TYPE
    }
}
