//! Cell coordinates of the invoice template.

/// Sheet the invoice is written to.
pub const SHEET_NAME: &str = "Invoice";

/// Invoice date.
pub const DATE_CELL: &str = "G2";
/// Order number.
pub const ORDER_ID_CELL: &str = "G3";
/// Customer company.
pub const COMPANY_CELL: &str = "B7";
/// Customer phone.
pub const PHONE_CELL: &str = "C11";
/// Unit price column header, labelled with the output currency.
pub const UNIT_PRICE_HEADER_CELL: &str = "F14";
/// Subtotal column header, labelled with the output currency.
pub const SUBTOTAL_HEADER_CELL: &str = "G14";

/// Row of the first line item.
pub const FIRST_ITEM_ROW: u32 = 15;
/// Rows taken by one line item.
pub const ITEM_ROW_STRIDE: u32 = 2;
/// Last row an item may start on.
pub const LAST_ITEM_ROW: u32 = 36;

/// Sequence number column.
pub const SEQUENCE_COLUMN: &str = "B";
/// Description column.
pub const DESCRIPTION_COLUMN: &str = "C";
/// Quantity column.
pub const QUANTITY_COLUMN: &str = "E";
/// Unit price column.
pub const UNIT_PRICE_COLUMN: &str = "F";
/// Subtotal column.
pub const SUBTOTAL_COLUMN: &str = "G";

/// Date format of [`DATE_CELL`] and of invoice file names.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Rows line items are written to, in order.
pub fn item_rows() -> impl Iterator<Item = u32> {
    (FIRST_ITEM_ROW..=LAST_ITEM_ROW).step_by(ITEM_ROW_STRIDE as usize)
}

/// Number of line items the template can hold.
#[must_use]
pub const fn capacity() -> usize {
    ((LAST_ITEM_ROW - FIRST_ITEM_ROW) / ITEM_ROW_STRIDE + 1) as usize
}

/// Cell reference such as `C17`.
#[must_use]
pub fn cell(column: &str, row: u32) -> String {
    format!("{column}{row}")
}
