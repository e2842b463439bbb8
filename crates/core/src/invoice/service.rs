//! Invoice service: resolve, render, persist.

use std::sync::Arc;

use chrono::NaiveDate;
use orderdesk_shared::types::{CurrencyCode, OrderId};
use tracing::info;

use super::error::InvoiceError;
use super::resolver::{ProductCatalog, resolve_lines};
use super::types::{Invoice, InvoiceHeader, RenderedInvoice};
use super::writer::InvoiceWriter;
use crate::currency::ExchangeRateCache;
use crate::order::OrderItems;
use crate::storage::{StorageService, XLSX_CONTENT_TYPE};

/// Everything about an order the invoice needs besides its products.
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    /// Order being invoiced.
    pub order_id: OrderId,
    /// Decoded line items.
    pub items: OrderItems,
    /// Customer company.
    pub company: String,
    /// Customer phone.
    pub phone: Option<String>,
    /// Currency all amounts are shown in.
    pub currency: CurrencyCode,
    /// Issue date, printed on the sheet and in the file name.
    pub issued_on: NaiveDate,
}

/// Produces invoice workbooks for orders.
pub struct InvoiceService<C: ProductCatalog> {
    catalog: Arc<C>,
    rates: Arc<ExchangeRateCache>,
    storage: Arc<StorageService>,
    writer: Arc<InvoiceWriter>,
    output_prefix: String,
}

impl<C: ProductCatalog> InvoiceService<C> {
    /// Create a new invoice service.
    #[must_use]
    pub fn new(
        catalog: Arc<C>,
        rates: Arc<ExchangeRateCache>,
        storage: Arc<StorageService>,
        writer: Arc<InvoiceWriter>,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            rates,
            storage,
            writer,
            output_prefix: output_prefix.into(),
        }
    }

    /// Generates, stores and returns the invoice for `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The order has more items than the template holds
    /// - A line item references an unknown product
    /// - A converted price or subtotal overflows
    /// - The workbook cannot be rendered or stored
    pub async fn generate(&self, request: InvoiceRequest) -> Result<RenderedInvoice, InvoiceError> {
        // Checked before any catalog lookup or rate refresh.
        let count = request.items.len();
        if count > self.writer.capacity() {
            return Err(InvoiceError::TooManyLines {
                count,
                capacity: self.writer.capacity(),
            });
        }

        // Rate fetch failures are absorbed by the cache.
        self.rates.refresh_if_stale().await;
        let rates = self.rates.snapshot();

        let lines =
            resolve_lines(&request.items, request.currency, self.catalog.as_ref(), &rates).await?;

        let invoice = Invoice {
            header: InvoiceHeader {
                order_id: request.order_id,
                issued_on: request.issued_on,
                company: request.company,
                phone: request.phone,
            },
            currency: request.currency,
            lines,
        };

        let total = invoice.total().ok_or(InvoiceError::TotalOverflow)?;
        let bytes = self.writer.render(&invoice)?;
        let file_name = invoice.file_name();
        let storage_key = StorageService::invoice_key(&self.output_prefix, &file_name);
        self.storage
            .put(&storage_key, bytes.clone(), XLSX_CONTENT_TYPE)
            .await?;

        info!(
            order_id = %invoice.header.order_id,
            currency = %invoice.currency,
            lines = invoice.lines.len(),
            %total,
            key = %storage_key,
            "Invoice generated"
        );

        Ok(RenderedInvoice {
            file_name,
            storage_key,
            bytes,
            currency: invoice.currency,
            total,
            line_count: invoice.lines.len(),
        })
    }
}
