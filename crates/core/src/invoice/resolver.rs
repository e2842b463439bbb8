//! Resolves order line items into priced invoice lines.

use std::future::Future;

use orderdesk_shared::types::{CurrencyCode, ProductId};
use rust_decimal::Decimal;

use super::error::InvoiceError;
use super::types::{InvoiceLine, ProductSnapshot};
use crate::currency::{RateTable, convert, round_money};
use crate::order::OrderItems;

/// Read access to products by id.
///
/// This trait is implemented by the db crate.
pub trait ProductCatalog: Send + Sync {
    /// Finds a product regardless of its validity flag.
    fn find_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<ProductSnapshot>, InvoiceError>> + Send;
}

/// Prices one line in `currency`.
///
/// Products already priced in `currency` are not converted. The subtotal is
/// computed from the unrounded converted price and then rounded.
pub fn price_line(
    sequence: u32,
    product: &ProductSnapshot,
    quantity: u32,
    currency: CurrencyCode,
    rates: &RateTable,
) -> Result<InvoiceLine, InvoiceError> {
    let overflow = || InvoiceError::PriceOverflow {
        product_id: product.id.to_string(),
    };
    let unit_price = convert(product.unit_price, product.price_currency, currency, rates)
        .map_err(|_| overflow())?;
    let subtotal = unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(overflow)?;

    Ok(InvoiceLine {
        sequence,
        product_id: product.id.clone(),
        description: product.description(),
        quantity,
        unit_price: round_money(unit_price),
        subtotal: round_money(subtotal),
    })
}

/// Looks up every item and prices it, keeping item order.
///
/// Fails on the first product the catalog does not know.
pub async fn resolve_lines<C>(
    items: &OrderItems,
    currency: CurrencyCode,
    catalog: &C,
    rates: &RateTable,
) -> Result<Vec<InvoiceLine>, InvoiceError>
where
    C: ProductCatalog,
{
    let mut lines = Vec::with_capacity(items.len());
    for (sequence, item) in (1u32..).zip(items) {
        let product = catalog
            .find_product(&item.product_id)
            .await?
            .ok_or_else(|| InvoiceError::unresolvable(item.product_id.as_str()))?;
        lines.push(price_line(sequence, &product, item.quantity, currency, rates)?);
    }
    Ok(lines)
}
