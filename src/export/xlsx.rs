//! Spreadsheet sheets for the order export
//!
//! The workbook has two sheets, `Orders` and `Order Product`, each starting
//! with a fixed header row. Sheets are written in constant-memory mode: rows
//! go to disk as they are appended, so a sheet must be finished before the
//! next one starts. A sheet that reaches the row limit continues on a new
//! sheet with the same header, named `Orders (2)`, `Orders (3)` and so on.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::error::OrderResult;
use crate::models::{LineItem, Order, OrderNumber};

pub const ORDERS_SHEET: &str = "Orders";
pub const LINE_ITEMS_SHEET: &str = "Order Product";

pub const ORDERS_HEADER: [&str; 4] = [
    "Order Number",
    "Customer Name",
    "Order Date",
    "Grand Total",
];
pub const LINE_ITEMS_HEADER: [&str; 5] = [
    "Order Number",
    "Product Name",
    "Quantity",
    "Price",
    "Subtotal",
];

/// Rows an xlsx worksheet can hold, header included
pub const MAX_SHEET_ROWS: u32 = 1_048_576;

/// Date format used in the Orders sheet
const ORDER_DATE_FORMAT: &str = "%d-%m-%Y";

/// Workbook being streamed to disk
pub struct ExportWorkbook {
    workbook: Workbook,
    bold: Format,
    amount: Format,
    sheets: usize,
    rows_per_sheet: u32,
}

impl ExportWorkbook {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            bold: Format::new().set_bold(),
            amount: Format::new().set_num_format("0.00"),
            sheets: 0,
            rows_per_sheet: MAX_SHEET_ROWS,
        }
    }

    /// Start a continuation sheet after this many rows, header included
    pub fn with_rows_per_sheet(mut self, rows: u32) -> Self {
        self.rows_per_sheet = rows.clamp(2, MAX_SHEET_ROWS);
        self
    }

    /// Sheet for order headers
    pub fn orders(&mut self) -> OrderResult<SheetWriter<'_>> {
        SheetWriter::start(self, ORDERS_SHEET, &ORDERS_HEADER)
    }

    /// Sheet for line items
    pub fn line_items(&mut self) -> OrderResult<SheetWriter<'_>> {
        SheetWriter::start(self, LINE_ITEMS_SHEET, &LINE_ITEMS_HEADER)
    }

    /// Write the finished workbook to `path`
    pub fn save(mut self, path: &Path) -> OrderResult<()> {
        self.workbook.save(path)?;
        Ok(())
    }

    fn add_sheet(&mut self, name: &str, header: &[&str]) -> OrderResult<usize> {
        let sheet = self.workbook.add_worksheet_with_constant_memory();
        sheet.set_name(name)?;
        for (col, title) in (0u16..).zip(header) {
            sheet.write_string_with_format(0, col, *title, &self.bold)?;
        }

        self.sheets += 1;
        Ok(self.sheets - 1)
    }
}

impl Default for ExportWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

/// One logical sheet being filled row by row
pub struct SheetWriter<'w> {
    book: &'w mut ExportWorkbook,
    name: &'static str,
    header: &'static [&'static str],
    index: usize,
    parts: usize,
    next_row: u32,
    data_rows: usize,
}

impl<'w> SheetWriter<'w> {
    fn start(
        book: &'w mut ExportWorkbook,
        name: &'static str,
        header: &'static [&'static str],
    ) -> OrderResult<Self> {
        let index = book.add_sheet(name, header)?;
        Ok(Self {
            book,
            name,
            header,
            index,
            parts: 1,
            next_row: 1,
            data_rows: 0,
        })
    }

    /// Data rows written so far, not counting headers
    pub fn data_rows(&self) -> usize {
        self.data_rows
    }

    /// Worksheets used so far, continuation sheets included
    pub fn sheet_count(&self) -> usize {
        self.parts
    }

    pub fn append_order(&mut self, order: &Order) -> OrderResult<()> {
        let row = self.claim_row()?;
        let book = &mut *self.book;
        let sheet = book.workbook.worksheet_from_index(self.index)?;

        sheet.write_string(row, 0, order.order_no.to_string())?;
        sheet.write_string(row, 1, &order.customer_name)?;
        sheet.write_string(row, 2, order.order_date.format(ORDER_DATE_FORMAT).to_string())?;
        sheet.write_number_with_format(row, 3, order.grand_total.to_decimal(), &book.amount)?;
        Ok(())
    }

    pub fn append_line_item(
        &mut self,
        order_no: &OrderNumber,
        item: &LineItem,
    ) -> OrderResult<()> {
        let row = self.claim_row()?;
        let book = &mut *self.book;
        let sheet = book.workbook.worksheet_from_index(self.index)?;

        sheet.write_string(row, 0, order_no.to_string())?;
        sheet.write_string(row, 1, &item.product_name)?;
        sheet.write_number(row, 2, f64::from(item.qty))?;
        sheet.write_number_with_format(row, 3, item.price.to_decimal(), &book.amount)?;
        sheet.write_number_with_format(row, 4, item.subtotal.to_decimal(), &book.amount)?;
        Ok(())
    }

    /// Next free row, moving to a continuation sheet when this one is full
    fn claim_row(&mut self) -> OrderResult<u32> {
        if self.next_row >= self.book.rows_per_sheet {
            self.parts += 1;
            let name = format!("{} ({})", self.name, self.parts);
            self.index = self.book.add_sheet(&name, self.header)?;
            self.next_row = 1;
        }

        let row = self.next_row;
        self.next_row += 1;
        self.data_rows += 1;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItemDraft, LineItemId, Money, NewOrder, OrderId};
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn order(id: u64, sequence: u16) -> Order {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut order = Order::new(
            OrderId::from_raw(id),
            NewOrder {
                order_no: OrderNumber::new(date, sequence).unwrap(),
                customer_name: "Acme".into(),
                order_date: date,
            },
        );
        order.grand_total = Money::from_cents(2100);
        order
    }

    #[test]
    fn test_sheets_round_trip_through_reader() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("export.xlsx");
        let order = order(1, 1);
        let draft = LineItemDraft::new("Widget", 2, Money::from_cents(1050)).unwrap();
        let item = LineItem::new(LineItemId::from_raw(1), order.id, &draft);

        let mut book = ExportWorkbook::new();
        let mut orders = book.orders().unwrap();
        orders.append_order(&order).unwrap();
        assert_eq!(orders.data_rows(), 1);
        let mut items = book.line_items().unwrap();
        items.append_line_item(&order.order_no, &item).unwrap();
        book.save(&path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![ORDERS_SHEET, LINE_ITEMS_SHEET]);

        let range = workbook.worksheet_range(ORDERS_SHEET).unwrap();
        assert_eq!(range.height(), 2);
        assert_eq!(range.get((0, 0)), Some(&Data::String("Order Number".into())));
        assert_eq!(range.get((1, 0)), Some(&Data::String("INV202405010001".into())));
        assert_eq!(range.get((1, 2)), Some(&Data::String("01-05-2024".into())));
        assert_eq!(range.get((1, 3)), Some(&Data::Float(21.0)));

        let range = workbook.worksheet_range(LINE_ITEMS_SHEET).unwrap();
        assert_eq!(range.get((1, 1)), Some(&Data::String("Widget".into())));
        assert_eq!(range.get((1, 2)), Some(&Data::Float(2.0)));
        assert_eq!(range.get((1, 3)), Some(&Data::Float(10.5)));
    }

    #[test]
    fn test_full_sheet_continues_on_a_new_one() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("export.xlsx");

        let mut book = ExportWorkbook::new().with_rows_per_sheet(3);
        let mut orders = book.orders().unwrap();
        for n in 1..=5 {
            orders.append_order(&order(n, n as u16)).unwrap();
        }
        assert_eq!(orders.data_rows(), 5);
        assert_eq!(orders.sheet_count(), 3);
        book.line_items().unwrap();
        book.save(&path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Orders", "Orders (2)", "Orders (3)", "Order Product"]
        );
        let range = workbook.worksheet_range("Orders (2)").unwrap();
        assert_eq!(range.height(), 3);
        assert_eq!(range.get((0, 1)), Some(&Data::String("Customer Name".into())));
        assert_eq!(range.get((1, 0)), Some(&Data::String("INV202405010003".into())));
        assert_eq!(workbook.worksheet_range("Orders (3)").unwrap().height(), 2);
    }
}
