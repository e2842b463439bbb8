//! Fills the invoice spreadsheet template.

use std::io::Cursor;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::error::InvoiceError;
use super::layout::{
    self, COMPANY_CELL, DATE_CELL, DATE_FORMAT, DESCRIPTION_COLUMN, ORDER_ID_CELL, PHONE_CELL,
    QUANTITY_COLUMN, SEQUENCE_COLUMN, SHEET_NAME, SUBTOTAL_COLUMN, SUBTOTAL_HEADER_CELL,
    UNIT_PRICE_COLUMN, UNIT_PRICE_HEADER_CELL, cell,
};
use super::types::Invoice;

const MONEY_FORMAT: &str = "#,##0.00";

/// Row of the total below the last item slot in the built-in layout.
const BUILTIN_TOTAL_ROW: u32 = layout::LAST_ITEM_ROW + 2;

/// Writes invoices into a copy of a template workbook.
#[derive(Debug, Clone)]
pub struct InvoiceWriter {
    template: Template,
}

#[derive(Debug, Clone)]
enum Template {
    Builtin,
    Workbook(Vec<u8>),
}

impl InvoiceWriter {
    /// Writer using the built-in layout.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            template: Template::Builtin,
        }
    }

    /// Writer using an `.xlsx` template held in memory.
    ///
    /// The bytes are parsed once up front so a broken template fails at
    /// startup rather than on the first invoice.
    pub fn from_template_bytes(bytes: Vec<u8>) -> Result<Self, InvoiceError> {
        let mut book = read_workbook(&bytes)?;
        invoice_sheet(&mut book)?;
        Ok(Self {
            template: Template::Workbook(bytes),
        })
    }

    /// Writer using an `.xlsx` template on disk.
    pub fn from_template_path(path: &Path) -> Result<Self, InvoiceError> {
        let bytes = std::fs::read(path)
            .map_err(|e| InvoiceError::Template(format!("{}: {e}", path.display())))?;
        Self::from_template_bytes(bytes)
    }

    /// Item slots available.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        layout::capacity()
    }

    /// Renders `invoice` and returns the workbook bytes.
    ///
    /// Rejects invoices with more lines than the template holds. Invoices
    /// built by hand rather than through [`super::InvoiceService`] only get
    /// this check.
    pub fn render(&self, invoice: &Invoice) -> Result<Vec<u8>, InvoiceError> {
        let count = invoice.lines.len();
        if count > self.capacity() {
            return Err(InvoiceError::TooManyLines {
                count,
                capacity: self.capacity(),
            });
        }

        let mut book = match &self.template {
            Template::Builtin => builtin_workbook()?,
            Template::Workbook(bytes) => read_workbook(bytes)?,
        };
        let sheet = invoice_sheet(&mut book)?;
        write_header(sheet, invoice);
        write_lines(sheet, invoice);

        let mut out = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
            .map_err(|e| InvoiceError::Render(e.to_string()))?;
        Ok(out.into_inner())
    }
}

impl Default for InvoiceWriter {
    fn default() -> Self {
        Self::builtin()
    }
}

fn write_header(sheet: &mut Worksheet, invoice: &Invoice) {
    let header = &invoice.header;
    let currency = invoice.currency.as_str();

    sheet
        .get_cell_mut(DATE_CELL)
        .set_value_string(header.issued_on.format(DATE_FORMAT).to_string());
    sheet
        .get_cell_mut(ORDER_ID_CELL)
        .set_value_string(header.order_id.as_str());
    sheet
        .get_cell_mut(COMPANY_CELL)
        .set_value_string(header.company.as_str());
    sheet
        .get_cell_mut(PHONE_CELL)
        .set_value_string(header.phone.as_deref().unwrap_or_default());
    sheet
        .get_cell_mut(UNIT_PRICE_HEADER_CELL)
        .set_value_string(format!("Unit Price ({currency})"));
    sheet
        .get_cell_mut(SUBTOTAL_HEADER_CELL)
        .set_value_string(format!("Subtotal ({currency})"));
}

fn write_lines(sheet: &mut Worksheet, invoice: &Invoice) {
    for (line, row) in invoice.lines.iter().zip(layout::item_rows()) {
        sheet
            .get_cell_mut(cell(SEQUENCE_COLUMN, row).as_str())
            .set_value_number(line.sequence);
        sheet
            .get_cell_mut(cell(DESCRIPTION_COLUMN, row).as_str())
            .set_value_string(line.description.as_str());
        sheet
            .get_cell_mut(cell(QUANTITY_COLUMN, row).as_str())
            .set_value_number(line.quantity);
        sheet
            .get_cell_mut(cell(UNIT_PRICE_COLUMN, row).as_str())
            .set_value_number(to_cell_number(line.unit_price));
        sheet
            .get_cell_mut(cell(SUBTOTAL_COLUMN, row).as_str())
            .set_value_number(to_cell_number(line.subtotal));
    }
}

fn to_cell_number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn read_workbook(bytes: &[u8]) -> Result<Spreadsheet, InvoiceError> {
    umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
        .map_err(|e| InvoiceError::Template(e.to_string()))
}

fn invoice_sheet(book: &mut Spreadsheet) -> Result<&mut Worksheet, InvoiceError> {
    book.get_sheet_collection_mut()
        .iter_mut()
        .find(|sheet| sheet.get_name() == SHEET_NAME)
        .ok_or_else(|| InvoiceError::Template(format!("no sheet named '{SHEET_NAME}'")))
}

/// Layout used when no template file is configured.
fn builtin_workbook() -> Result<Spreadsheet, InvoiceError> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(SHEET_NAME)
        .map_err(|e| InvoiceError::Template(e.to_string()))?;

    let labels = [
        ("F2", "Date"),
        ("F3", "Invoice No."),
        ("B6", "Bill To"),
        ("B11", "Phone"),
        ("B14", "No."),
        ("C14", "Description"),
        ("E14", "Qty"),
    ];
    for (coordinate, text) in labels {
        sheet.get_cell_mut(coordinate).set_value_string(text);
    }
    sheet.get_cell_mut("B2").set_value_string("INVOICE");
    sheet.get_style_mut("B2").get_font_mut().set_bold(true);
    for coordinate in ["B14", "C14", "E14", UNIT_PRICE_HEADER_CELL, SUBTOTAL_HEADER_CELL] {
        sheet.get_style_mut(coordinate).get_font_mut().set_bold(true);
    }

    for row in layout::item_rows() {
        for column in [UNIT_PRICE_COLUMN, SUBTOTAL_COLUMN] {
            sheet
                .get_style_mut(cell(column, row).as_str())
                .get_number_format_mut()
                .set_format_code(MONEY_FORMAT);
        }
    }

    let total_label = cell(UNIT_PRICE_COLUMN, BUILTIN_TOTAL_ROW);
    let total = cell(SUBTOTAL_COLUMN, BUILTIN_TOTAL_ROW);
    sheet
        .get_cell_mut(total_label.as_str())
        .set_value_string("Total");
    sheet.get_cell_mut(total.as_str()).set_formula(format!(
        "SUM({}:{})",
        cell(SUBTOTAL_COLUMN, layout::FIRST_ITEM_ROW),
        cell(SUBTOTAL_COLUMN, layout::LAST_ITEM_ROW)
    ));
    sheet
        .get_style_mut(total.as_str())
        .get_number_format_mut()
        .set_format_code(MONEY_FORMAT);

    sheet.get_column_dimension_mut("C").set_width(48.0);
    sheet.get_column_dimension_mut("F").set_width(18.0);
    sheet.get_column_dimension_mut("G").set_width(18.0);

    Ok(book)
}

/// Reads back the workbook produced by [`InvoiceWriter::render`].
#[cfg(test)]
pub(crate) fn read_rendered(bytes: &[u8]) -> Spreadsheet {
    read_workbook(bytes).expect("rendered workbook should parse")
}

/// The built-in layout as `.xlsx` bytes, for template tests.
#[cfg(test)]
pub(crate) fn builtin_template_bytes() -> Vec<u8> {
    let book = builtin_workbook().expect("builtin layout");
    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out).expect("write");
    out.into_inner()
}
