//! Workbook/sheet document model for finmerge
//!
//! A [`Book`] is an ordered set of named [`Sheet`]s plus workbook-level
//! defined names. Sheets are 1-indexed grids of [`Cell`]s; each cell holds a
//! [`CellValue`] (including formulas with their last calculated result) and a
//! [`CellStyle`].
//!
//! # Examples
//!
//! ```
//! use finmerge_sheet::{Book, CellValue, Sheet};
//!
//! let mut sheet = Sheet::with_name("Data");
//! sheet.set_a1("A5", "Revenue").unwrap();
//! sheet.set_formula("C2", "=VLOOKUP(A2,A5:B10,2,FALSE)").unwrap();
//!
//! assert_eq!(sheet.max_row(), 5);
//! assert!(sheet.is_row_blank(4));
//! assert_eq!(sheet.get_a1("A5").unwrap(), &CellValue::from("Revenue"));
//!
//! let mut book = Book::new();
//! book.add_sheet("Data", sheet).unwrap();
//! assert_eq!(book.sheet_names(), vec!["Data"]);
//! ```
//!
//! Workbooks are read with calamine and written with rust_xlsxwriter; see
//! [`Book::from_xlsx`] and [`Book::save_as_xlsx`].

mod a1_notation;
mod book;
mod cell;
mod error;
mod sheet;
mod style;
mod xlsx;

pub use a1_notation::{
    column_index_to_letters, column_letters_to_index, parse_a1, to_a1_notation, CellRect,
};
pub use book::Book;
pub use cell::{Cell, CellValue, FormulaCell};
pub use error::{Result, SheetError};
pub use sheet::{Sheet, MAX_COLS, MAX_ROWS};
pub use style::{CellStyle, HorizontalAlign, NumberFormat, VerticalAlign};
