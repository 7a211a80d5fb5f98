use crate::book::Book;
use crate::cell::{Cell, CellValue};
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use crate::style::{CellStyle, HorizontalAlign, NumberFormat, VerticalAlign};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{Format, FormatAlign, Formula, Workbook, Worksheet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellValue::Date(datetime.date()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d")
            .map_or_else(|_| CellValue::String(s.clone()), CellValue::Date),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

/// Days since the 1899-12-30 epoch, the way Excel stores dates.
fn date_to_serial(date: NaiveDate) -> f64 {
    const EPOCH_DAYS_FROM_CE: i32 = 693_594;
    f64::from(date.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
}

fn cell_format(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if style.number_format != NumberFormat::General {
        format = format.set_num_format(style.number_format.code());
    }
    format = match style.horizontal {
        HorizontalAlign::General => format,
        HorizontalAlign::Left => format.set_align(FormatAlign::Left),
        HorizontalAlign::Center => format.set_align(FormatAlign::Center),
        HorizontalAlign::Right => format.set_align(FormatAlign::Right),
    };
    format = match style.vertical {
        VerticalAlign::Bottom => format,
        VerticalAlign::Center => format.set_align(FormatAlign::VerticalCenter),
        VerticalAlign::Top => format.set_align(FormatAlign::Top),
    };
    if style.wrap_text {
        format = format.set_text_wrap();
    }
    format
}

impl Book {
    /// Load a book from an Excel file: values, formulas and defined names.
    ///
    /// Formula cells keep the value stored in the file as their cached result.
    /// Cell styles and column widths are not read, so saving a loaded book
    /// only carries the styles set in memory.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook: Xlsx<BufReader<File>> = open_workbook(path.as_ref())?;

        let name = path
            .as_ref()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Book1");
        let mut book = Book::with_name(name);

        let sheet_names: Vec<String> = workbook
            .sheet_names()
            .iter()
            .map(ToString::to_string)
            .collect();

        for sheet_name in sheet_names {
            let mut sheet = Sheet::with_name(&sheet_name);

            let range = workbook.worksheet_range(&sheet_name)?;
            // Range start offset (data may not begin at A1)
            let (start_row, start_col) = range.start().unwrap_or((0, 0));
            for (r, c, data) in range.cells() {
                if matches!(data, Data::Empty) {
                    continue;
                }
                let row = start_row + r as u32 + 1;
                let col = start_col + c as u32 + 1;
                sheet.set_value(row, col, data_to_cell_value(data))?;
            }

            let formulas = workbook.worksheet_formula(&sheet_name)?;
            let (start_row, start_col) = formulas.start().unwrap_or((0, 0));
            for (r, c, formula) in formulas.cells() {
                if formula.is_empty() {
                    continue;
                }
                let row = start_row + r as u32 + 1;
                let col = start_col + c as u32 + 1;
                let cell = sheet.cell_mut(row, col)?;
                let cached = std::mem::take(&mut cell.value);
                cell.value = CellValue::formula(formula.as_str());
                if !cached.is_null() {
                    cell.value.set_cached(cached);
                }
            }

            book.add_sheet(&sheet_name, sheet)?;
        }

        for (name, refers_to) in workbook.defined_names() {
            book.define_name(name, refers_to);
        }

        Ok(book)
    }

    /// Save the book to an Excel file, including formulas, cell styles and
    /// defined names.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut workbook = Workbook::new();

        for (name, sheet) in self.sheets() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name)?;
            for (row, col, cell) in sheet.cells() {
                write_cell(worksheet, row, col, cell)?;
            }
        }

        for (name, refers_to) in self.defined_names() {
            // Built-in names (print areas, filters) belong to worksheet settings.
            if name.starts_with("_xlnm.") {
                continue;
            }
            let formula = if refers_to.starts_with('=') {
                refers_to.clone()
            } else {
                format!("={refers_to}")
            };
            workbook.define_name(name, &formula)?;
        }

        workbook.save(path.as_ref())?;
        Ok(())
    }
}

/// Write a single cell; `row`/`col` are 1-based.
fn write_cell(worksheet: &mut Worksheet, row: u32, col: u32, cell: &Cell) -> Result<()> {
    let row_num = row - 1;
    let col_num = u16::try_from(col - 1).map_err(|_| SheetError::IndexOutOfBounds {
        row,
        col,
        max_rows: crate::sheet::MAX_ROWS,
        max_cols: crate::sheet::MAX_COLS,
    })?;
    let format = cell_format(&cell.style);

    match &cell.value {
        CellValue::Null => {
            if !cell.style.is_default() {
                worksheet.write_blank(row_num, col_num, &format)?;
            }
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean_with_format(row_num, col_num, *b, &format)?;
        }
        CellValue::Int(i) => {
            // Excel stores all numbers as f64
            worksheet.write_number_with_format(row_num, col_num, *i as f64, &format)?;
        }
        CellValue::Float(f) => {
            worksheet.write_number_with_format(row_num, col_num, *f, &format)?;
        }
        CellValue::String(s) => {
            worksheet.write_string_with_format(row_num, col_num, s, &format)?;
        }
        CellValue::Date(d) => {
            let format = if cell.style.number_format == NumberFormat::General {
                format.set_num_format(NumberFormat::IsoDate.code())
            } else {
                format
            };
            worksheet.write_number_with_format(row_num, col_num, date_to_serial(*d), &format)?;
        }
        CellValue::Formula(formula) => {
            let mut xlsx_formula = Formula::new(formula.source.as_str());
            if let Some(cached) = formula.cached.as_deref() {
                if !cached.is_null() {
                    xlsx_formula = xlsx_formula.set_result(cached.to_string());
                }
            }
            worksheet.write_formula_with_format(row_num, col_num, xlsx_formula, &format)?;
        }
    }
    Ok(())
}
